//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod analyze;
pub mod health;

pub use crate::state::AppState;
pub use analyze::{analyze_handler, analyze_image_handler, AnalyzeImageRequest, AnalyzeResponse};
pub use health::{health, ping, ready, HealthResponse, PingResponse, ReadyResponse};
