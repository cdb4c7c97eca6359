//! Shared application state injected into all Axum handlers.

use std::time::Instant;

use crate::service::Dispatcher;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay dispatcher owning all connection and booking tables.
    pub dispatcher: Dispatcher,
    /// Process start time, reported by the health endpoint.
    pub started_at: Instant,
}

impl AppState {
    /// Builds state around a fresh dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            started_at: Instant::now(),
        }
    }
}
