use crate::service::TrackerService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TrackerService>,
}

impl AppState {
    pub fn new(service: Arc<TrackerService>) -> Self {
        Self { service }
    }
}
