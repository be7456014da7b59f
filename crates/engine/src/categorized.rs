//! Categorized records: the tagged income/expense log
//! (`other_transaction`), the only log that feeds the room balance.
//!
//! `amount` is always stored positive; the sign comes from [`EntryKind`].

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine, util::normalize_tag};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    /// Parses user input, ignoring surrounding whitespace and case.
    pub fn parse(raw: &str) -> ResultEngine<Self> {
        match normalize_tag(raw).as_str() {
            "Income" => Ok(Self::Income),
            "Expense" => Ok(Self::Expense),
            _ => Err(EngineError::Validation(format!(
                "kind must be Income or Expense, got {raw:?}"
            ))),
        }
    }

    /// Applies this kind's sign to a positive amount.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::Income => amount,
            // Ledger amounts are positive, so the negation cannot overflow.
            Self::Expense => Money::from_minor(amount.minor().saturating_neg()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Food,
    Shopping,
    Entertainment,
    Bills,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Food,
        Self::Shopping,
        Self::Entertainment,
        Self::Bills,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::Bills => "Bills",
            Self::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> ResultEngine<Self> {
        let normalized = normalize_tag(raw);
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| EngineError::Validation(format!("unknown category {raw:?}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedRecord {
    pub id: i32,
    pub user_id: i32,
    pub room_id: i32,
    pub kind: EntryKind,
    pub category: Category,
    pub amount: Money,
    pub note: String,
    pub updated_at: DateTime<Utc>,
}

impl CategorizedRecord {
    /// `+amount` for income, `-amount` for expense.
    pub fn net_contribution(&self) -> Money {
        self.kind.signed(self.amount)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "other_transaction")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub room_id: i32,
    pub kind: String,
    pub category: String,
    pub amount: i64,
    pub note: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rooms::Entity",
        from = "Column::RoomId",
        to = "super::rooms::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Rooms,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for CategorizedRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        if model.amount <= 0 {
            return Err(EngineError::Validation(format!(
                "categorized record {} holds a non-positive amount",
                model.id
            )));
        }
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            room_id: model.room_id,
            kind: EntryKind::parse(&model.kind)?,
            category: Category::parse(&model.category)?,
            amount: Money::from_minor(model.amount),
            note: model.note,
            updated_at: model.updated_at,
        })
    }
}
