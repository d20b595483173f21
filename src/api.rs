use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use crate::{
    app_state::AppState,
    chat,
    error::AppError,
    models::{ChatRequest, ChatResponse, NewspaperRecord, NewspaperSummary},
};

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/newspapers", get(list_newspapers_handler))
        .route("/newspapers/:id", get(get_newspaper_handler))
        .route("/chat", post(chat_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Backend is running. Connect your frontend to /health and other endpoints."
    }))
}

#[axum::debug_handler]
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = Utc::now() - state.started_at;
    Json(json!({ "status": "ok", "uptime_secs": uptime.num_seconds() }))
}

#[axum::debug_handler]
async fn list_newspapers_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewspaperSummary>>, AppError> {
    let newspapers = state.store.list().await.map_err(log_failure)?;
    Ok(Json(newspapers))
}

#[axum::debug_handler]
async fn get_newspaper_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NewspaperRecord>, AppError> {
    let record = state.store.fetch(&id).await.map_err(log_failure)?;
    Ok(Json(record))
}

#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let response = chat::chat_with_newspaper(
        state.store.as_ref(),
        &state.generator,
        &payload,
        state.config.request_timeout,
    )
    .await
    .map_err(log_failure)?;

    Ok(Json(response))
}

/// Deja constancia en el log de los fallos internos (5xx) antes de responder.
fn log_failure(err: AppError) -> AppError {
    if err.status_code().is_server_error() {
        error!("Error atendiendo la petición: {err}");
    }
    err
}
