use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{accounts, entries, transfers};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::create))
        .route("/accounts/{id}/balance", get(accounts::balance))
        .route("/accounts/{id}/credit", post(entries::credit))
        .route("/accounts/{id}/debit", post(entries::debit))
        .route("/accounts/{id}/entries", get(entries::list))
        .route("/entries/{id}", get(entries::detail))
        .route("/transfers", post(transfers::create))
        .route("/transfers/{id}", get(transfers::detail))
        .with_state(state)
}

/// Bind `addr` and serve until the listener fails.
pub async fn run(engine: Engine, addr: &str) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(engine, listener).await
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
