//! Rooms, registration and the room overview.

use api_types::{
    member::{MemberView, RegisterMember},
    room::{
        OverviewQuery, RoomBalanceView, RoomListResponse, RoomNew, RoomOverviewView, RoomView,
    },
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use engine::RegisterMemberCmd;

use crate::{ApiJson, ApiPath, ApiQuery, ServerError, server::ServerState, views};

pub async fn list(State(state): State<ServerState>) -> Result<Json<RoomListResponse>, ServerError> {
    let rooms = state.engine.list_rooms().await?;
    Ok(Json(RoomListResponse {
        rooms: rooms.into_iter().map(views::room_listing).collect(),
    }))
}

pub async fn room_new(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<RoomNew>,
) -> Result<(StatusCode, Json<RoomView>), ServerError> {
    let room = state.engine.create_room(&payload.room_name).await?;
    Ok((StatusCode::CREATED, Json(views::room(room))))
}

pub async fn room_get(
    State(state): State<ServerState>,
    ApiPath(room_id): ApiPath<i32>,
) -> Result<Json<RoomView>, ServerError> {
    let room = state.engine.room(room_id).await?;
    Ok(Json(views::room(room)))
}

pub async fn register(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<RegisterMember>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let member = state
        .engine
        .register_member(RegisterMemberCmd {
            full_name: payload.full_name,
            email: payload.email,
            password: payload.password,
            confirm_password: payload.confirm_password,
            room_id: payload.room_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(views::member(member))))
}

pub async fn overview(
    State(state): State<ServerState>,
    ApiPath(room_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<OverviewQuery>,
) -> Result<Json<RoomOverviewView>, ServerError> {
    let overview = state.engine.room_overview(room_id, query.user_id).await?;
    Ok(Json(RoomOverviewView {
        totals: views::totals(&overview.flow_totals),
        room: views::room(overview.room),
        members: overview.members,
        balance_minor: overview.balance.minor(),
        daily_income: views::daily(overview.daily_income),
        daily_expense: views::daily(overview.daily_expense),
    }))
}

pub async fn balance(
    State(state): State<ServerState>,
    ApiPath(room_id): ApiPath<i32>,
) -> Result<Json<RoomBalanceView>, ServerError> {
    let balance = state.engine.room_balance(room_id).await?;
    Ok(Json(RoomBalanceView {
        room_id,
        total_minor: balance.as_ref().map_or(0, |b| b.total.minor()),
        updated_at: balance.map(|b| b.updated_at),
    }))
}
