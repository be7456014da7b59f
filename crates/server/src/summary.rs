//! Read-side projections of a room.

use api_types::{
    activity::ActivityResponse,
    summary::{SummaryQuery, SummaryResponse},
};
use axum::{Json, extract::State};

use crate::{ApiPath, ApiQuery, ServerError, server::ServerState, views};

pub async fn get_summary(
    State(state): State<ServerState>,
    ApiPath(room_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ServerError> {
    let summary = state.engine.ledger_summary(room_id, query.user_id).await?;
    Ok(Json(SummaryResponse {
        room_summary: views::totals(&summary.room),
        user_summary: views::totals(&summary.user),
    }))
}

pub async fn activity(
    State(state): State<ServerState>,
    ApiPath(room_id): ApiPath<i32>,
) -> Result<Json<ActivityResponse>, ServerError> {
    let feed = state.engine.list_room_activity(room_id).await?;
    Ok(Json(ActivityResponse {
        room_id,
        transactions: feed.into_iter().map(views::activity).collect(),
    }))
}
