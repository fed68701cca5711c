//! Application state shared across handlers

use crate::config::Settings;
use crate::search::PlaceService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Suggestion and details operations
    pub service: Arc<PlaceService>,
}

impl AppState {
    /// Wrap the service, applying the configured limits
    pub fn new(settings: &Settings, service: PlaceService) -> Self {
        Self {
            service: Arc::new(service.with_limits(&settings.search)),
        }
    }
}
