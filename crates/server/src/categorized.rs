//! Categorized entries: the endpoints that move the room balance.

use api_types::categorized::{
    CategorizedCreated, CategorizedDeleted, CategorizedEdit, CategorizedEdited, CategorizedList,
    CategorizedListResponse, CategorizedNew,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use engine::{CategorizedFilter, EditCategorizedCmd, RecordCategorizedCmd};

use crate::{ApiJson, ApiPath, ApiQuery, ServerError, server::ServerState, views};

pub async fn categorized_new(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<CategorizedNew>,
) -> Result<(StatusCode, Json<CategorizedCreated>), ServerError> {
    let receipt = state
        .engine
        .record_categorized(RecordCategorizedCmd {
            room_id: payload.room_id,
            user_id: payload.user_id,
            kind: payload.kind,
            category: payload.category,
            amount_minor: payload.amount_minor,
            note: payload.note,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CategorizedCreated {
            record: views::categorized(receipt.record),
            room_total_minor: receipt.new_total.minor(),
        }),
    ))
}

pub async fn categorized_edit(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CategorizedEdit>,
) -> Result<Json<CategorizedEdited>, ServerError> {
    let outcome = state
        .engine
        .edit_categorized(EditCategorizedCmd {
            id,
            amount_minor: payload.amount_minor,
        })
        .await?;
    Ok(Json(CategorizedEdited {
        old: views::categorized(outcome.old),
        new: views::categorized(outcome.new),
        delta_minor: outcome.delta.minor(),
        room_total_minor: outcome.room_total.map(|total| total.minor()),
    }))
}

pub async fn categorized_delete(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<CategorizedDeleted>, ServerError> {
    let outcome = state.engine.delete_categorized(id).await?;
    Ok(Json(CategorizedDeleted {
        deleted: views::categorized(outcome.deleted),
        adjustment_minor: outcome.adjustment.minor(),
        room_total_minor: outcome.room_total.minor(),
    }))
}

pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<CategorizedList>,
) -> Result<Json<CategorizedListResponse>, ServerError> {
    let page = state
        .engine
        .list_categorized(&CategorizedFilter {
            room_id: query.room_id,
            user_id: query.user_id,
            limit: query.limit,
            cursor: query.cursor,
        })
        .await?;
    Ok(Json(CategorizedListResponse {
        items: page.items.into_iter().map(views::categorized).collect(),
        next_cursor: page.next_cursor,
    }))
}
