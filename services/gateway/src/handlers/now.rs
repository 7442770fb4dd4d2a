use crate::error::AppError;
use crate::models::{NowResponse, SummaryResponse};
use crate::state::AppState;
use axum::{Json, extract::State};

pub async fn get_now(State(state): State<AppState>) -> Result<Json<NowResponse>, AppError> {
    Ok(Json(state.service.now().await?))
}

pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, AppError> {
    Ok(Json(state.service.summary().await?))
}
