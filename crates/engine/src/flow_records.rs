//! Flow records: the simple per-user income/expense log
//! (`user_transactions`).
//!
//! A record carries two independent non-negative fields. The write paths only
//! ever set one of them, but nothing in the schema enforces exclusivity, so an
//! edit may target either field. The record's contribution to its room is
//! always `income - expense`.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money};

/// Which of the two flow fields an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowField {
    Income,
    Expense,
}

impl FlowField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub(crate) fn column(self) -> Column {
        match self {
            Self::Income => Column::Income,
            Self::Expense => Column::Expense,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: i32,
    pub user_id: i32,
    pub room_id: i32,
    pub income: Money,
    pub expense: Money,
    pub updated_at: DateTime<Utc>,
}

impl FlowRecord {
    /// Signed contribution of this record to its room: `income - expense`.
    pub fn net_contribution(&self) -> Money {
        // Both fields are non-negative: the difference always fits.
        Money::from_minor(self.income.minor().saturating_sub(self.expense.minor()))
    }

    pub fn field(&self, field: FlowField) -> Money {
        match field {
            FlowField::Income => self.income,
            FlowField::Expense => self.expense,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub room_id: i32,
    pub income: i64,
    pub expense: i64,
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

impl TryFrom<Model> for FlowRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        if model.income < 0 || model.expense < 0 {
            return Err(EngineError::Validation(format!(
                "flow record {} holds a negative amount",
                model.id
            )));
        }
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            room_id: model.room_id,
            income: Money::from_minor(model.income),
            expense: Money::from_minor(model.expense),
            updated_at: model.updated_at,
        })
    }
}
