//! Results returned by reconciling operations.

use serde::{Deserialize, Serialize};

use crate::{CategorizedRecord, FlowRecord, LedgerSummary, Money};

/// A committed categorized write and the room total it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedReceipt {
    pub record: CategorizedRecord,
    pub new_total: Money,
}

/// A committed flow write plus the recomputed totals for its room and user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowReceipt {
    pub record: FlowRecord,
    pub summary: LedgerSummary,
}

/// Before/after view of an edit.
///
/// `delta` is `net(new) - net(old)`. `room_total` is the balance after the
/// edit when the edit was reconciled into it, `None` for flow edits, which
/// leave the balance alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome<T> {
    pub old: T,
    pub new: T,
    pub delta: Money,
    pub room_total: Option<Money>,
}

/// A deleted record and what was subtracted from the room balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome<T> {
    pub deleted: T,
    pub adjustment: Money,
    pub room_total: Money,
}

/// Stored vs recomputed room balance.
///
/// `recomputed` only folds categorized records, so flow deletions show up as
/// drift.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAudit {
    pub room_id: i32,
    pub stored: Option<Money>,
    pub recomputed: Money,
    pub drift: Money,
}

/// One row of the combined room activity feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ActivityEntry {
    Flow(FlowRecord),
    Categorized(CategorizedRecord),
}

impl ActivityEntry {
    pub fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            Self::Flow(record) => record.updated_at,
            Self::Categorized(record) => record.updated_at,
        }
    }
}
