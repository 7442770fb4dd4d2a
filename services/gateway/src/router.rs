use crate::handlers::{epochs, health, now};
use crate::state::AppState;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/epochs", get(epochs::list_epochs))
        .route("/epochs/{epoch}", get(epochs::get_epoch))
        .route("/epochs/{epoch}/speed", get(epochs::get_speed))
        .route("/epochs/{epoch}/location", get(epochs::get_location))
        .route("/now", get(now::get_now))
        .route("/summary", get(now::get_summary))
        .route("/-/healthy", get(health::healthy))
        .route("/-/ready", get(health::ready))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
