use thiserror::Error;

use crate::mapping::EntityKind;

/// Main error type for storygraph
#[derive(Error, Debug)]
pub enum StorygraphError {
    /// The requested center/detail page does not exist upstream
    #[error("{} with ID {id} not found", .kind.display_name())]
    NotFound { kind: EntityKind, id: String },

    /// A batched upstream fetch did not finish inside its window
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// A batched upstream fetch failed for any other reason
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using StorygraphError
pub type Result<T> = std::result::Result<T, StorygraphError>;
