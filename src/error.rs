//! Error types for armory_watch

use thiserror::Error;

/// Unified error type for armory_watch operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Character does not exist at the data source
    #[error("character not found: {name} on {server}")]
    NotFound { server: String, name: String },
    /// Access token rejected and could not be renewed within the retry budget
    #[error("authorization expired and could not be renewed")]
    AuthExpired,
    /// Source response did not contain the expected markers or fields
    #[error("failed to parse source response: {0}")]
    Parse(String),
    /// HTTP request failed (connectivity, timeout, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Unexpected HTTP error status from the data source
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Durable write of the tracked-entity registry failed
    #[error("failed to persist tracked characters: {0}")]
    Persistence(#[from] std::io::Error),
    /// Tracked-entity registry could not be encoded or decoded
    #[error("failed to encode tracked characters: {0}")]
    Encode(#[from] serde_json::Error),
    /// Notification sink rejected the payload
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

impl TrackerError {
    /// True for failures of the durable store, which are escalated instead of
    /// being treated like a skippable per-character fetch problem.
    pub fn is_persistence(&self) -> bool {
        matches!(self, TrackerError::Persistence(_) | TrackerError::Encode(_))
    }
}

/// Result alias for armory_watch operations
pub type Result<T> = std::result::Result<T, TrackerError>;
