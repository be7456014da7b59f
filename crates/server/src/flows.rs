//! Simple income/expense endpoints.

use api_types::flow::{FlowCreated, FlowDeleted, FlowEdit, FlowEdited, FlowNew};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use engine::{EditFlowCmd, FlowReceipt, RecordFlowCmd};

use crate::{ApiJson, ApiPath, ServerError, server::ServerState, views};

fn created(receipt: FlowReceipt) -> (StatusCode, Json<FlowCreated>) {
    (
        StatusCode::CREATED,
        Json(FlowCreated {
            room_summary: views::totals(&receipt.summary.room),
            user_summary: views::totals(&receipt.summary.user),
            record: views::flow(receipt.record),
        }),
    )
}

fn command(payload: FlowNew) -> RecordFlowCmd {
    RecordFlowCmd {
        room_id: payload.room_id,
        user_id: payload.user_id,
        amount_minor: payload.amount_minor,
    }
}

pub async fn income_new(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<FlowNew>,
) -> Result<(StatusCode, Json<FlowCreated>), ServerError> {
    let receipt = state.engine.record_income(command(payload)).await?;
    Ok(created(receipt))
}

pub async fn expense_new(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<FlowNew>,
) -> Result<(StatusCode, Json<FlowCreated>), ServerError> {
    let receipt = state.engine.record_expense(command(payload)).await?;
    Ok(created(receipt))
}

pub async fn flow_edit(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<FlowEdit>,
) -> Result<Json<FlowEdited>, ServerError> {
    let outcome = state
        .engine
        .edit_flow(EditFlowCmd {
            id,
            income_minor: payload.income_minor,
            expense_minor: payload.expense_minor,
        })
        .await?;
    Ok(Json(FlowEdited {
        old: views::flow(outcome.old),
        new: views::flow(outcome.new),
        delta_minor: outcome.delta.minor(),
    }))
}

pub async fn flow_delete(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<FlowDeleted>, ServerError> {
    let outcome = state.engine.delete_flow(id).await?;
    Ok(Json(FlowDeleted {
        deleted: views::flow(outcome.deleted),
        adjustment_minor: outcome.adjustment.minor(),
        room_total_minor: outcome.room_total.minor(),
    }))
}
