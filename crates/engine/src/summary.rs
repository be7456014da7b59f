//! Read-side projections recomputed from ledger rows.
//!
//! These never consult `room_balance`: the flow-log totals and the stored
//! balance are independent views and may disagree.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{FlowRecord, Money, ResultEngine};

/// Income/expense totals over a set of flow records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub income: Money,
    pub expense: Money,
    pub net: Money,
    /// Most recent `updated_at` among the folded rows, `None` when empty.
    pub last_updated: Option<DateTime<Utc>>,
}

impl FlowTotals {
    /// Fails with `Validation` when a total does not fit in `i64`.
    pub(crate) fn fold<'a>(
        records: impl IntoIterator<Item = &'a FlowRecord>,
    ) -> ResultEngine<Self> {
        let records: Vec<&FlowRecord> = records.into_iter().collect();
        let income = Money::try_sum(records.iter().map(|record| record.income))?;
        let expense = Money::try_sum(records.iter().map(|record| record.expense))?;
        Ok(Self {
            income,
            expense,
            net: income.try_sub(expense)?,
            last_updated: records.iter().map(|record| record.updated_at).max(),
        })
    }
}

/// Room-wide and per-user flow totals, as returned after a flow write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub room: FlowTotals,
    pub user: FlowTotals,
}

/// One calendar day (UTC) of a per-day series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAmount {
    pub day: NaiveDate,
    pub amount: Money,
}

/// Everything a member sees when opening a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOverview {
    pub room: crate::Room,
    pub members: Vec<String>,
    pub flow_totals: FlowTotals,
    /// Stored room balance, zero when the room never had a reconciling write.
    pub balance: Money,
    /// Ascending by day, merging both logs for the requested user.
    pub daily_income: Vec<DailyAmount>,
    pub daily_expense: Vec<DailyAmount>,
}
