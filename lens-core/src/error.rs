//! Error types for the analysis pipeline.
//!
//! Only [`AnalysisError`] escapes [`crate::Orchestrator::analyze`]; search and
//! cache failures are caught and logged where they happen.

use thiserror::Error;

/// Maximum length of an upstream message embedded in an error or log line.
pub const MAX_ERROR_MESSAGE_LEN: usize = 1000;

/// The image handle did not resolve to readable bytes.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Failed to read image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The landmark/web-entity detection call failed.
#[derive(Error, Debug)]
pub enum VisionApiError {
    #[error("Vision request failed: {0}")]
    Request(String),

    #[error("Vision API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Vision API error: {0}")]
    Upstream(String),

    #[error("Failed to decode vision response: {0}")]
    Decode(String),

    #[error("Vision client error: {0}")]
    Client(String),
}

/// An image-search call (historic photos or events) failed.
#[derive(Error, Debug)]
pub enum SearchApiError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode search response: {0}")]
    Decode(String),

    #[error("No results for query '{0}'")]
    NoResults(String),

    #[error("Search client error: {0}")]
    Client(String),
}

/// Local key-value store failure. Never escapes the cache.
#[derive(Error, Debug)]
pub enum CacheIoError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a whole `analyze` call.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Image unreadable: {0}")]
    ImageUnreadable(#[from] HashError),

    #[error(transparent)]
    Vision(#[from] VisionApiError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Failed to initialize {component}: {message}")]
    Init {
        component: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Cut an upstream message to [`MAX_ERROR_MESSAGE_LEN`] characters, appending `...`.
pub fn truncate_message(message: &str) -> String {
    match message.char_indices().nth(MAX_ERROR_MESSAGE_LEN) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}
