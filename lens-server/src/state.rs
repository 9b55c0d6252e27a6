//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use lens_core::Orchestrator;

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Analysis pipeline, also exposing the vision client for the proxy endpoint
    pub orchestrator: Orchestrator,
    /// Maximum accepted upload size in bytes
    pub max_file_size: usize,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, config: &Config) -> Self {
        Self {
            orchestrator,
            max_file_size: config.max_file_size,
        }
    }
}
