//! Shared-room ledger engine.
//!
//! Two logs feed a room: simple flow records (`user_transactions`) and
//! categorized records (`other_transaction`). Only the categorized log is
//! reconciled into the materialized `room_balance`; flow records are summed
//! on demand, except that deleting one subtracts it from the balance.
//!
//! All operations hang off [`Engine`], which owns the injected database pool.

pub use categorized::{Category, CategorizedRecord, EntryKind};
pub use commands::{
    EditCategorizedCmd, EditFlowCmd, RecordCategorizedCmd, RecordFlowCmd, RegisterMemberCmd,
};
pub use error::EngineError;
pub use flow_records::{FlowField, FlowRecord};
pub use money::Money;
pub use ops::{
    CategorizedFilter, CategorizedPage, DEFAULT_PAGE_SIZE, DEFAULT_TX_TIMEOUT, Engine,
    EngineBuilder, FaultHook, FaultPoint,
};
pub use outcomes::{
    ActivityEntry, BalanceAudit, CategorizedReceipt, DeleteOutcome, EditOutcome, FlowReceipt,
};
pub use room_balance::RoomBalance;
pub use rooms::{ROOM_CAPACITY, Room, RoomListing, RoomStatus};
pub use summary::{DailyAmount, FlowTotals, LedgerSummary, RoomOverview};
pub use users::Member;

mod categorized;
mod commands;
mod error;
mod flow_records;
mod money;
mod ops;
mod outcomes;
mod room_balance;
mod rooms;
mod summary;
mod update_set;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
