//! HTTP surface: router assembly and the small endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::hook_handler::hook_handler;
use crate::state::SharedBridge;
use crate::webhook::webhook_handler;

/// `/health` and `/hook` are fixed; every other POST path is treated as
/// the Telegram webhook so the bot can be registered under any secret path.
pub fn build_router(state: SharedBridge) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/hook", post(hook_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<SharedBridge>) -> impl IntoResponse {
    let muted = state.lock().await.session.is_muted();
    Json(json!({ "ok": true, "muted": muted }))
}

async fn fallback_handler(
    method: Method,
    state: State<SharedBridge>,
    body: Bytes,
) -> Response {
    if method == Method::POST {
        webhook_handler(state, body).await.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
