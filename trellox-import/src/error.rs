//! Error types for the import pipeline

use thiserror::Error;
use trellox_board::BoardError;

/// Result type for import operations
pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The source answered with a non-success status
    #[error("request to {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },

    /// The request never got a response
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The response body was not the expected shape
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// A record the pipeline cannot convert
    #[error("invalid {kind}: {message}")]
    InvalidRecord { kind: String, message: String },

    #[error("no boards selected for import")]
    NothingSelected,

    /// Every selected board failed
    #[error("failed to import any boards: {}", failed.join(", "))]
    NothingImported { failed: Vec<String> },

    #[error("store error: {0}")]
    Store(#[from] BoardError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ImportError {
    pub fn invalid_record(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Map a transport failure onto the error taxonomy
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::Http {
                url: url.to_string(),
                status: status.as_u16(),
            };
        }
        if error.is_decode() {
            return Self::Decode {
                url: url.to_string(),
                message: error.to_string(),
            };
        }
        Self::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    /// Credentials were rejected by the source
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }
}
