use crate::error::AppError;
use crate::models::{EpochsQuery, LocationResponse, SpeedResponse};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use types::sample::Sample;

pub async fn list_epochs(
    State(state): State<AppState>,
    Query(query): Query<EpochsQuery>,
) -> Result<Json<Vec<Sample>>, AppError> {
    let (limit, offset) = query.pagination()?;
    let samples = state.service.list(limit, offset).await?;
    Ok(Json(samples))
}

pub async fn get_epoch(
    State(state): State<AppState>,
    Path(epoch): Path<String>,
) -> Result<Json<Sample>, AppError> {
    Ok(Json(state.service.sample(&epoch).await?))
}

pub async fn get_speed(
    State(state): State<AppState>,
    Path(epoch): Path<String>,
) -> Result<Json<SpeedResponse>, AppError> {
    Ok(Json(state.service.speed(&epoch).await?))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(epoch): Path<String>,
) -> Result<Json<LocationResponse>, AppError> {
    Ok(Json(state.service.location(&epoch).await?))
}
