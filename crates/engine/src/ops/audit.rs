use chrono::Utc;
use sea_orm::Order;

use crate::{BalanceAudit, CategorizedRecord, Money, ResultEngine, util::require_id};

use super::{Engine, store, with_tx};

impl Engine {
    /// Compare the stored room balance with the signed sum of the room's
    /// categorized records. Nothing is written.
    pub async fn audit_room_balance(&self, room_id: i32) -> ResultEngine<BalanceAudit> {
        require_id(room_id, "room_id")?;
        store::require_room(&self.database, room_id).await?;

        let stored = store::stored_balance(&self.database, room_id)
            .await?
            .map(|balance| balance.total);
        let recomputed = self.recompute_room_balance(&self.database, room_id).await?;
        let drift = stored.unwrap_or(Money::ZERO).try_sub(recomputed)?;
        if !drift.is_zero() {
            tracing::warn!(room_id, %drift, "room balance drifted from categorized records");
        }
        Ok(BalanceAudit {
            room_id,
            stored,
            recomputed,
            drift,
        })
    }

    /// Overwrite the stored room balance with the recomputed categorized sum,
    /// under the room lock. Returns the audit taken before the overwrite.
    pub async fn rebuild_room_balance(&self, room_id: i32) -> ResultEngine<BalanceAudit> {
        require_id(room_id, "room_id")?;

        let audit = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let locked = store::lock_room_balance(&db_tx, room_id, now).await?;
            let stored = Money::from_minor(locked.total);
            let recomputed = self.recompute_room_balance(&db_tx, room_id).await?;
            let drift = stored.try_sub(recomputed)?;
            store::apply_balance_delta(&db_tx, &locked, drift.try_neg()?, now).await?;
            Ok(BalanceAudit {
                room_id,
                stored: Some(stored),
                recomputed,
                drift,
            })
        })?;

        tracing::info!(room_id, drift = %audit.drift, total = %audit.recomputed, "room balance rebuilt");
        Ok(audit)
    }

    async fn recompute_room_balance<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        room_id: i32,
    ) -> ResultEngine<Money> {
        let records = store::categorized_in_room(db, room_id, None, Order::Asc).await?;
        Money::try_sum(records.iter().map(CategorizedRecord::net_contribution))
    }
}
