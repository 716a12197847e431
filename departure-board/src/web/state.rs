//! Application state for the web layer.

use crate::sensor::SensorStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Latest sensor states, written by the poller
    pub sensors: SensorStore,
}

impl AppState {
    pub fn new(sensors: SensorStore) -> Self {
        Self { sensors }
    }
}
