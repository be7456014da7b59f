//! Rooms: shared ledger scopes with at most [`ROOM_CAPACITY`] members.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum number of members a room accepts.
pub const ROOM_CAPACITY: u64 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Occupancy as reported by room listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// At least one seat left.
    Empty,
    /// [`ROOM_CAPACITY`] reached.
    Max,
}

impl RoomStatus {
    pub fn for_member_count(count: u64) -> Self {
        if count >= ROOM_CAPACITY {
            Self::Max
        } else {
            Self::Empty
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Max => "max",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListing {
    pub room: Room,
    pub user_count: u64,
    pub status: RoomStatus,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub room_name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
    #[sea_orm(has_one = "super::room_balance::Entity")]
    RoomBalance,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::room_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoomBalance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Room {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.room_name,
            created_at: model.created_at,
        }
    }
}
