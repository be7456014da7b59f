use std::collections::BTreeMap;

use chrono::NaiveDate;
use sea_orm::{Order, QueryFilter, QueryOrder, prelude::*};

use crate::{
    DailyAmount, EngineError, EntryKind, FlowTotals, LedgerSummary, Money, ResultEngine, Room,
    RoomOverview, users,
    util::require_id,
};

use super::{Engine, store};

impl Engine {
    /// Income/expense totals over every flow record of a room, recomputed
    /// from the rows. The stored room balance is not consulted.
    pub async fn room_summary(&self, room_id: i32) -> ResultEngine<FlowTotals> {
        require_id(room_id, "room_id")?;
        store::require_room(&self.database, room_id).await?;
        let rows = store::flows_in_room(&self.database, room_id, None, Order::Asc).await?;
        FlowTotals::fold(&rows)
    }

    /// Same as [`Engine::room_summary`] restricted to one user's records.
    pub async fn user_summary(&self, room_id: i32, user_id: i32) -> ResultEngine<FlowTotals> {
        require_id(room_id, "room_id")?;
        require_id(user_id, "user_id")?;
        store::require_room(&self.database, room_id).await?;
        let rows = store::flows_in_room(&self.database, room_id, Some(user_id), Order::Asc).await?;
        FlowTotals::fold(&rows)
    }

    /// Room and user totals read in one pass.
    pub async fn ledger_summary(&self, room_id: i32, user_id: i32) -> ResultEngine<LedgerSummary> {
        require_id(room_id, "room_id")?;
        require_id(user_id, "user_id")?;
        store::require_room(&self.database, room_id).await?;
        self.summarize_flows(&self.database, room_id, user_id).await
    }

    pub(super) async fn summarize_flows<C: ConnectionTrait>(
        &self,
        db: &C,
        room_id: i32,
        user_id: i32,
    ) -> ResultEngine<LedgerSummary> {
        let rows = store::flows_in_room(db, room_id, None, Order::Asc).await?;
        Ok(LedgerSummary {
            room: FlowTotals::fold(&rows)?,
            user: FlowTotals::fold(rows.iter().filter(|row| row.user_id == user_id))?,
        })
    }

    /// What a member sees when opening a room: members, flow totals, the
    /// stored balance and the member's own per-day income and expense
    /// across both logs.
    pub async fn room_overview(&self, room_id: i32, user_id: i32) -> ResultEngine<RoomOverview> {
        require_id(room_id, "room_id")?;
        require_id(user_id, "user_id")?;
        let room = Room::from(store::require_room(&self.database, room_id).await?);

        let members: Vec<users::Model> = users::Entity::find()
            .filter(users::Column::RoomId.eq(room_id))
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;
        if !members.iter().any(|member| member.id == user_id) {
            return Err(EngineError::NotFound(format!(
                "member {user_id} of room {room_id}"
            )));
        }

        let flows = store::flows_in_room(&self.database, room_id, None, Order::Asc).await?;
        let categorized =
            store::categorized_in_room(&self.database, room_id, Some(user_id), Order::Asc).await?;
        let balance = store::stored_balance(&self.database, room_id)
            .await?
            .map_or(Money::ZERO, |balance| balance.total);

        let mut income: BTreeMap<NaiveDate, Money> = BTreeMap::new();
        let mut expense: BTreeMap<NaiveDate, Money> = BTreeMap::new();
        for row in flows.iter().filter(|row| row.user_id == user_id) {
            let day = row.updated_at.date_naive();
            if row.income.is_positive() {
                add_to_day(&mut income, day, row.income)?;
            }
            if row.expense.is_positive() {
                add_to_day(&mut expense, day, row.expense)?;
            }
        }
        for row in &categorized {
            let series = match row.kind {
                EntryKind::Income => &mut income,
                EntryKind::Expense => &mut expense,
            };
            add_to_day(series, row.updated_at.date_naive(), row.amount)?;
        }

        Ok(RoomOverview {
            room,
            members: members.into_iter().map(|member| member.full_name).collect(),
            flow_totals: FlowTotals::fold(&flows)?,
            balance,
            daily_income: into_series(income),
            daily_expense: into_series(expense),
        })
    }
}

fn add_to_day(
    days: &mut BTreeMap<NaiveDate, Money>,
    day: NaiveDate,
    amount: Money,
) -> ResultEngine<()> {
    let slot = days.entry(day).or_default();
    *slot = slot.try_add(amount)?;
    Ok(())
}

fn into_series(days: BTreeMap<NaiveDate, Money>) -> Vec<DailyAmount> {
    days.into_iter()
        .map(|(day, amount)| DailyAmount { day, amount })
        .collect()
}
