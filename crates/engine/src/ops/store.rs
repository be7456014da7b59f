//! Ledger store primitives shared by the reconciler and the projector.
//!
//! Every function takes the connection it runs on, so the caller decides
//! whether it is part of a unit of work or a plain read.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, DbBackend, Order, QueryFilter, QueryOrder, QuerySelect,
    prelude::*, sea_query::OnConflict,
};

use crate::{
    CategorizedRecord, EngineError, FlowRecord, Money, ResultEngine, RoomBalance, categorized,
    flow_records, room_balance, rooms,
};

pub(super) async fn require_room<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
) -> ResultEngine<rooms::Model> {
    rooms::Entity::find_by_id(room_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("room {room_id}")))
}

pub(super) async fn require_flow<C: ConnectionTrait>(db: &C, id: i32) -> ResultEngine<FlowRecord> {
    flow_records::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("flow record {id}")))?
        .try_into()
}

pub(super) async fn require_categorized<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> ResultEngine<CategorizedRecord> {
    categorized::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("categorized record {id}")))?
        .try_into()
}

/// Takes the exclusive lock on a room's balance row, creating it with a zero
/// total first if the room has none.
///
/// The insert-if-absent is the first write of the transaction: on SQLite it
/// acquires the database write lock, on PostgreSQL it serializes concurrent
/// creators on the primary key. The `FOR UPDATE` read then pins the row on
/// backends with row locks. Concurrent writers to the same room queue here
/// until the holder commits or rolls back.
pub(super) async fn lock_room_balance(
    db_tx: &DatabaseTransaction,
    room_id: i32,
    now: DateTime<Utc>,
) -> ResultEngine<room_balance::Model> {
    let seed = room_balance::ActiveModel {
        room_id: ActiveValue::Set(room_id),
        total: ActiveValue::Set(0),
        updated_at: ActiveValue::Set(now),
    };
    room_balance::Entity::insert(seed)
        .on_conflict(
            OnConflict::column(room_balance::Column::RoomId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db_tx)
        .await
        .map_err(|err| EngineError::from(err).missing_reference(&format!("room {room_id}")))?;

    let mut query = room_balance::Entity::find_by_id(room_id);
    if db_tx.get_database_backend() != DbBackend::Sqlite {
        query = query.lock_exclusive();
    }
    query
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("room {room_id}")))
}

/// Writes `locked.total + delta` back to a row obtained from
/// [`lock_room_balance`] in the same transaction.
pub(super) async fn apply_balance_delta(
    db_tx: &DatabaseTransaction,
    locked: &room_balance::Model,
    delta: Money,
    now: DateTime<Utc>,
) -> ResultEngine<Money> {
    let new_total = Money::from_minor(locked.total).try_add(delta)?;
    room_balance::ActiveModel {
        room_id: ActiveValue::Set(locked.room_id),
        total: ActiveValue::Set(new_total.minor()),
        updated_at: ActiveValue::Set(now),
    }
    .update(db_tx)
    .await?;
    Ok(new_total)
}

pub(super) async fn stored_balance<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
) -> ResultEngine<Option<RoomBalance>> {
    Ok(room_balance::Entity::find_by_id(room_id)
        .one(db)
        .await?
        .map(RoomBalance::from))
}

/// Flow records of a room (optionally one user), ordered by `updated_at`.
pub(super) async fn flows_in_room<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
    user_id: Option<i32>,
    order: Order,
) -> ResultEngine<Vec<FlowRecord>> {
    let mut query = flow_records::Entity::find().filter(flow_records::Column::RoomId.eq(room_id));
    if let Some(user_id) = user_id {
        query = query.filter(flow_records::Column::UserId.eq(user_id));
    }
    query
        .order_by(flow_records::Column::UpdatedAt, order.clone())
        .order_by(flow_records::Column::Id, order)
        .all(db)
        .await?
        .into_iter()
        .map(FlowRecord::try_from)
        .collect()
}

/// Categorized records of a room (optionally one user), ordered by
/// `updated_at`.
pub(super) async fn categorized_in_room<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
    user_id: Option<i32>,
    order: Order,
) -> ResultEngine<Vec<CategorizedRecord>> {
    let mut query = categorized::Entity::find().filter(categorized::Column::RoomId.eq(room_id));
    if let Some(user_id) = user_id {
        query = query.filter(categorized::Column::UserId.eq(user_id));
    }
    query
        .order_by(categorized::Column::UpdatedAt, order.clone())
        .order_by(categorized::Column::Id, order)
        .all(db)
        .await?
        .into_iter()
        .map(CategorizedRecord::try_from)
        .collect()
}
