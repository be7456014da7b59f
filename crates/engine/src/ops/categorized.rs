use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, prelude::*};

use crate::{
    CategorizedReceipt, CategorizedRecord, Category, DeleteOutcome, EditCategorizedCmd,
    EditOutcome, EngineError, EntryKind, Money, RecordCategorizedCmd, ResultEngine, categorized,
    update_set::UpdateSet,
    util::{normalize_note, require_id, require_positive},
};

use super::{Engine, FaultPoint, store, with_tx};

impl Engine {
    /// Add a categorized entry and fold it into the room balance.
    ///
    /// The room balance row is locked (and created at zero if missing) before
    /// anything else; an expense larger than the locked total is rejected.
    pub async fn record_categorized(
        &self,
        cmd: RecordCategorizedCmd,
    ) -> ResultEngine<CategorizedReceipt> {
        require_id(cmd.room_id, "room_id")?;
        require_id(cmd.user_id, "user_id")?;
        let kind = EntryKind::parse(&cmd.kind)?;
        let category = Category::parse(&cmd.category)?;
        let amount = require_positive(cmd.amount_minor, "amount")?;
        let note = normalize_note(cmd.note.as_deref());
        let room_id = cmd.room_id;

        let receipt = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let locked = store::lock_room_balance(&db_tx, room_id, now).await?;
            let current = Money::from_minor(locked.total);
            if kind == EntryKind::Expense && amount > current {
                tracing::warn!(room_id, %amount, balance = %current, "expense rejected");
                return Err(EngineError::InsufficientFunds(format!(
                    "room {room_id} holds {current}, expense is {amount}"
                )));
            }

            let model = categorized::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(cmd.user_id),
                room_id: ActiveValue::Set(room_id),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                category: ActiveValue::Set(category.as_str().to_string()),
                amount: ActiveValue::Set(amount.minor()),
                note: ActiveValue::Set(note),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| {
                EngineError::from(err).missing_reference(&format!("user {}", cmd.user_id))
            })?;
            self.inject_fault(FaultPoint::AfterLedgerWrite { room_id })?;

            let record = CategorizedRecord::try_from(model)?;
            let new_total =
                store::apply_balance_delta(&db_tx, &locked, record.net_contribution(), now).await?;
            Ok(CategorizedReceipt { record, new_total })
        })?;

        tracing::info!(
            room_id,
            record_id = receipt.record.id,
            delta = %receipt.record.net_contribution(),
            total = %receipt.new_total,
            "categorized entry recorded"
        );
        Ok(receipt)
    }

    /// Change the amount of a categorized record and apply
    /// `net(new) - net(old)` to the room balance.
    ///
    /// Kind and category stay as they are. An edit may take the balance
    /// below zero; only new expenses are checked against it.
    pub async fn edit_categorized(
        &self,
        cmd: EditCategorizedCmd,
    ) -> ResultEngine<EditOutcome<CategorizedRecord>> {
        require_id(cmd.id, "id")?;
        let amount = require_positive(cmd.amount_minor, "amount")?;

        let outcome = with_tx!(self, |db_tx| {
            let now = Utc::now();
            // Room is immutable, so the unlocked read is only used to find it.
            let room_id = store::require_categorized(&db_tx, cmd.id).await?.room_id;
            let locked = store::lock_room_balance(&db_tx, room_id, now).await?;
            let old = store::require_categorized(&db_tx, cmd.id).await?;

            UpdateSet::<categorized::Entity>::new()
                .set(categorized::Column::Amount, amount.minor())
                .set(categorized::Column::UpdatedAt, now)
                .apply(categorized::Entity::update_many())?
                .filter(categorized::Column::Id.eq(old.id))
                .exec(&db_tx)
                .await?;
            self.inject_fault(FaultPoint::AfterLedgerWrite { room_id })?;

            let new = CategorizedRecord {
                amount,
                updated_at: now,
                ..old.clone()
            };
            let delta = new.net_contribution().try_sub(old.net_contribution())?;
            let room_total = store::apply_balance_delta(&db_tx, &locked, delta, now).await?;
            Ok(EditOutcome {
                old,
                new,
                delta,
                room_total: Some(room_total),
            })
        })?;

        tracing::info!(
            room_id = outcome.new.room_id,
            record_id = outcome.new.id,
            delta = %outcome.delta,
            total = ?outcome.room_total,
            "categorized entry edited"
        );
        Ok(outcome)
    }

    /// Remove a categorized record and subtract its net contribution from
    /// the room balance.
    pub async fn delete_categorized(
        &self,
        id: i32,
    ) -> ResultEngine<DeleteOutcome<CategorizedRecord>> {
        require_id(id, "id")?;

        let outcome = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let room_id = store::require_categorized(&db_tx, id).await?.room_id;
            let locked = store::lock_room_balance(&db_tx, room_id, now).await?;
            let deleted = store::require_categorized(&db_tx, id).await?;

            categorized::Entity::delete_by_id(deleted.id)
                .exec(&db_tx)
                .await?;
            self.inject_fault(FaultPoint::AfterLedgerWrite { room_id })?;

            let adjustment = deleted.net_contribution();
            let room_total =
                store::apply_balance_delta(&db_tx, &locked, adjustment.try_neg()?, now).await?;
            Ok(DeleteOutcome {
                deleted,
                adjustment,
                room_total,
            })
        })?;

        tracing::info!(
            room_id = outcome.deleted.room_id,
            record_id = outcome.deleted.id,
            adjustment = %outcome.adjustment,
            total = %outcome.room_total,
            "categorized entry deleted"
        );
        Ok(outcome)
    }
}
