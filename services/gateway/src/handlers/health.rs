use crate::models::ReadyResponse;
use crate::service::LoadState;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};

pub async fn healthy() -> &'static str {
    "OK"
}

/// 200 once a dataset is loaded, 503 before.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let current = state.service.state();
    let status = match current {
        LoadState::Ready => StatusCode::OK,
        LoadState::Uninitialized => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ReadyResponse { state: current }))
}
