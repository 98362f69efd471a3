//! Shared application state.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! only holds the relay registry; the relay keeps no board state.

use crate::config::Config;
use crate::relay::Relay;

/// Clone is required by Axum; the registry is `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
}

impl AppState {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self { relay: Relay::new(config.channel_capacity) }
    }
}
