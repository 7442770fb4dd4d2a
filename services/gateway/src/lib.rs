//! ISS Tracker Gateway
//!
//! HTTP API over the ISS state-vector dataset:
//! - `/epochs`, `/epochs/{epoch}`: raw samples (paged)
//! - `/epochs/{epoch}/speed`, `/epochs/{epoch}/location`: derived values
//! - `/now`: position and speed at the sample nearest the current time
//! - `/summary`: dataset time range and average speed
//! - `/-/healthy`, `/-/ready`: liveness and load state

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod resolver;
pub mod router;
pub mod service;
pub mod state;

pub use error::AppError;
pub use router::create_router;
pub use service::{LoadState, ServiceError, TrackerService};
pub use state::AppState;
