use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DbBackend, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, Member, ROOM_CAPACITY, RegisterMemberCmd, ResultEngine, Room, RoomBalance,
    RoomListing, RoomStatus, rooms,
    users::{self, hash_password},
    util::{require_id, require_text},
};

use super::{Engine, store, with_tx};

impl Engine {
    /// Create an empty room.
    pub async fn create_room(&self, name: &str) -> ResultEngine<Room> {
        let name = require_text(name, "room_name")?;
        let room = with_tx!(self, |db_tx| {
            let model = rooms::ActiveModel {
                id: ActiveValue::NotSet,
                room_name: ActiveValue::Set(name),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(Room::from(model))
        })?;
        tracing::info!(room_id = room.id, name = %room.name, "room created");
        Ok(room)
    }

    pub async fn room(&self, room_id: i32) -> ResultEngine<Room> {
        require_id(room_id, "room_id")?;
        Ok(store::require_room(&self.database, room_id).await?.into())
    }

    /// Every room with its member count, oldest first.
    pub async fn list_rooms(&self) -> ResultEngine<Vec<RoomListing>> {
        let counts: HashMap<i32, i64> = users::Entity::find()
            .select_only()
            .column(users::Column::RoomId)
            .column_as(Expr::col(users::Column::Id).count(), "user_count")
            .group_by(users::Column::RoomId)
            .into_tuple::<(i32, i64)>()
            .all(&self.database)
            .await?
            .into_iter()
            .collect();

        let rooms = rooms::Entity::find()
            .order_by_asc(rooms::Column::Id)
            .all(&self.database)
            .await?;
        Ok(rooms
            .into_iter()
            .map(|model| {
                let user_count = counts
                    .get(&model.id)
                    .map_or(0, |count| u64::try_from(*count).unwrap_or_default());
                RoomListing {
                    room: model.into(),
                    user_count,
                    status: RoomStatus::for_member_count(user_count),
                }
            })
            .collect())
    }

    /// Members of a room in registration order.
    pub async fn room_members(&self, room_id: i32) -> ResultEngine<Vec<Member>> {
        require_id(room_id, "room_id")?;
        store::require_room(&self.database, room_id).await?;
        Ok(users::Entity::find()
            .filter(users::Column::RoomId.eq(room_id))
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Member::from)
            .collect())
    }

    /// The stored running total, `None` until the room's first reconciling
    /// write.
    pub async fn room_balance(&self, room_id: i32) -> ResultEngine<Option<RoomBalance>> {
        require_id(room_id, "room_id")?;
        store::require_room(&self.database, room_id).await?;
        store::stored_balance(&self.database, room_id).await
    }

    /// Add a member to a room that still has a free seat.
    pub async fn register_member(&self, cmd: RegisterMemberCmd) -> ResultEngine<Member> {
        let full_name = require_text(&cmd.full_name, "full_name")?;
        let email = require_text(&cmd.email, "email")?.to_lowercase();
        if !email.contains('@') {
            return Err(EngineError::Validation(format!("invalid email {email:?}")));
        }
        if cmd.password.is_empty() {
            return Err(EngineError::Validation("password is required".to_string()));
        }
        if cmd.password != cmd.confirm_password {
            return Err(EngineError::Validation(
                "password confirmation does not match".to_string(),
            ));
        }
        require_id(cmd.room_id, "room_id")?;
        let password_hash = hash_password(&cmd.password)?;
        let room_id = cmd.room_id;

        let member = with_tx!(self, |db_tx| {
            let mut room = rooms::Entity::find_by_id(room_id);
            if db_tx.get_database_backend() != DbBackend::Sqlite {
                room = room.lock_exclusive();
            }
            room.one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("room {room_id}")))?;

            let seated = users::Entity::find()
                .filter(users::Column::RoomId.eq(room_id))
                .count(&db_tx)
                .await?;
            if seated >= ROOM_CAPACITY {
                tracing::warn!(room_id, seated, "registration rejected, room is full");
                return Err(EngineError::Validation(format!("room {room_id} is full")));
            }

            let taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .count(&db_tx)
                .await?;
            if taken > 0 {
                return Err(EngineError::Validation(format!(
                    "email {email} is already registered"
                )));
            }

            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                full_name: ActiveValue::Set(full_name),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(password_hash),
                room_id: ActiveValue::Set(room_id),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    EngineError::Validation(format!("email {email} is already registered"))
                }
                _ => EngineError::from(err),
            })?;
            Ok(Member::from(model))
        })?;

        tracing::info!(room_id, member_id = member.id, "member registered");
        Ok(member)
    }
}
