//! Command structs for engine write operations.
//!
//! Raw user input (kind and category tags, notes) is carried as given; the
//! engine normalizes and validates it before opening a transaction.

/// Add a simple income or expense entry to the flow log.
#[derive(Clone, Debug)]
pub struct RecordFlowCmd {
    pub room_id: i32,
    pub user_id: i32,
    pub amount_minor: i64,
}

/// Add a categorized entry; feeds the room balance.
#[derive(Clone, Debug)]
pub struct RecordCategorizedCmd {
    pub room_id: i32,
    pub user_id: i32,
    pub kind: String,
    pub category: String,
    pub amount_minor: i64,
    pub note: Option<String>,
}

impl RecordCategorizedCmd {
    #[must_use]
    pub fn new(
        room_id: i32,
        user_id: i32,
        kind: impl Into<String>,
        category: impl Into<String>,
        amount_minor: i64,
    ) -> Self {
        Self {
            room_id,
            user_id,
            kind: kind.into(),
            category: category.into(),
            amount_minor,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Change one field of a flow record. Exactly one of `income_minor` /
/// `expense_minor` must be present.
#[derive(Clone, Debug, Default)]
pub struct EditFlowCmd {
    pub id: i32,
    pub income_minor: Option<i64>,
    pub expense_minor: Option<i64>,
}

/// Change the amount of a categorized record. Kind and category are
/// immutable.
#[derive(Clone, Debug)]
pub struct EditCategorizedCmd {
    pub id: i32,
    pub amount_minor: i64,
}

/// Register a new member in a room.
#[derive(Clone, Debug)]
pub struct RegisterMemberCmd {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub room_id: i32,
}
