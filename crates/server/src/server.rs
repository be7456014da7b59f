use axum::{
    Router,
    routing::{get, patch, post},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{categorized, flows, rooms, summary};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// All routes of the ledger API. Identity is not checked: `user_id` and
/// `room_id` are trusted as sent.
pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };
    Router::new()
        .route("/rooms", get(rooms::list).post(rooms::room_new))
        .route("/rooms/{room_id}", get(rooms::room_get))
        .route("/register", post(rooms::register))
        .route("/rooms/{room_id}/overview", get(rooms::overview))
        .route("/rooms/{room_id}/balance", get(rooms::balance))
        .route("/rooms/{room_id}/summary", get(summary::get_summary))
        .route("/rooms/{room_id}/transactions", get(summary::activity))
        .route("/income", post(flows::income_new))
        .route("/expense", post(flows::expense_new))
        .route(
            "/flows/{id}",
            patch(flows::flow_edit).delete(flows::flow_delete),
        )
        .route(
            "/categorized",
            post(categorized::categorized_new).get(categorized::list),
        )
        .route(
            "/categorized/{id}",
            patch(categorized::categorized_edit).delete(categorized::categorized_delete),
        )
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
