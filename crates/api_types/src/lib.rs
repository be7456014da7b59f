use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind, e.g. `validation`, `not_found`,
    /// `insufficient_funds`, `conflict`, `timeout`, `bad_request`,
    /// `internal`.
    pub kind: String,
    pub message: String,
    /// `true` when the same request may succeed if sent again later.
    pub retryable: bool,
}

pub mod room {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomNew {
        pub room_name: String,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RoomStatus {
        Empty,
        Max,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomView {
        pub id: i32,
        pub room_name: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomListItem {
        pub id: i32,
        pub room_name: String,
        pub created_at: DateTime<Utc>,
        pub user_count: u64,
        pub status: RoomStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomListResponse {
        pub rooms: Vec<RoomListItem>,
    }

    /// Stored running total of a room. `updated_at` is absent until the
    /// first reconciling write.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomBalanceView {
        pub room_id: i32,
        pub total_minor: i64,
        pub updated_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DailyAmount {
        pub day: NaiveDate,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverviewQuery {
        pub user_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomOverviewView {
        pub room: RoomView,
        pub members: Vec<String>,
        pub totals: super::summary::TotalsView,
        pub balance_minor: i64,
        pub daily_income: Vec<DailyAmount>,
        pub daily_expense: Vec<DailyAmount>,
    }
}

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterMember {
        pub full_name: String,
        pub email: String,
        pub password: String,
        pub confirm_password: String,
        pub room_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: i32,
        pub full_name: String,
        pub email: String,
        pub room_id: i32,
        pub created_at: DateTime<Utc>,
    }
}

pub mod summary {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TotalsView {
        pub income_minor: i64,
        pub expense_minor: i64,
        pub net_minor: i64,
        /// Absent when no flow record exists.
        pub last_updated: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub user_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryResponse {
        pub room_summary: TotalsView,
        pub user_summary: TotalsView,
    }
}

pub mod flow {
    use super::*;

    /// Body of `POST /income` and `POST /expense`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowNew {
        pub room_id: i32,
        pub user_id: i32,
        pub amount_minor: i64,
    }

    /// Exactly one of the two fields must be present.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FlowEdit {
        pub income_minor: Option<i64>,
        pub expense_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowView {
        pub id: i32,
        pub room_id: i32,
        pub user_id: i32,
        pub income_minor: i64,
        pub expense_minor: i64,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowCreated {
        pub record: FlowView,
        pub room_summary: super::summary::TotalsView,
        pub user_summary: super::summary::TotalsView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowEdited {
        pub old: FlowView,
        pub new: FlowView,
        pub delta_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowDeleted {
        pub deleted: FlowView,
        pub adjustment_minor: i64,
        pub room_total_minor: i64,
    }
}

pub mod categorized {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum EntryKind {
        Income,
        Expense,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Category {
        Food,
        Shopping,
        Entertainment,
        Bills,
        Other,
    }

    /// Body of `POST /categorized`.
    ///
    /// `kind` and `category` are matched ignoring case and surrounding
    /// whitespace.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizedNew {
        pub room_id: i32,
        pub user_id: i32,
        pub kind: String,
        pub category: String,
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizedEdit {
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizedView {
        pub id: i32,
        pub room_id: i32,
        pub user_id: i32,
        pub kind: EntryKind,
        pub category: Category,
        pub amount_minor: i64,
        pub note: String,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizedCreated {
        pub record: CategorizedView,
        pub room_total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizedEdited {
        pub old: CategorizedView,
        pub new: CategorizedView,
        pub delta_minor: i64,
        pub room_total_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizedDeleted {
        pub deleted: CategorizedView,
        pub adjustment_minor: i64,
        pub room_total_minor: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategorizedList {
        pub room_id: Option<i32>,
        pub user_id: Option<i32>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizedListResponse {
        pub items: Vec<CategorizedView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}

pub mod activity {
    use super::*;

    /// One row of `GET /rooms/{room_id}/transactions`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "source", rename_all = "snake_case")]
    pub enum ActivityView {
        Flow(super::flow::FlowView),
        Categorized(super::categorized::CategorizedView),
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActivityResponse {
        pub room_id: i32,
        pub transactions: Vec<ActivityView>,
    }
}
