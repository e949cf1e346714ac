//! Error types for the board engine

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur in board operations
#[derive(Debug, Error)]
pub enum BoardError {
    /// Board not found
    #[error("board not found: {id}")]
    BoardNotFound { id: String },

    /// List not found
    #[error("list not found: {id}")]
    ListNotFound { id: String },

    /// Card not found
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Generic resource not found (labels, checklists, members, etc.)
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// A position outside the sequence bounds
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The acting user's role does not allow the action
    #[error("permission denied: {user} may not {action}")]
    PermissionDenied { user: String, action: String },

    /// Operation not allowed in the current state
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// The stored board moved on since it was read
    #[error("stale revision for board {id}: expected {expected}, found {actual}")]
    StaleRevision {
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Lock is held by another process
    #[error("lock busy - another operation in progress")]
    LockBusy,

    /// Notification template failed to parse or render
    #[error("template error: {message}")]
    Template { message: String },

    /// An external collaborator failed
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: String,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoardError {
    /// Create a not found error for any nested resource
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(user: impl Into<String>, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            user: user.into(),
            action: action.into(),
        }
    }

    /// Create a collaborator failure
    pub fn collaborator(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockBusy | Self::StaleRevision { .. })
    }

    /// Errors a user can act on and that should be shown as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. }
                | Self::BoardNotFound { .. }
                | Self::ListNotFound { .. }
                | Self::CardNotFound { .. }
                | Self::NotFound { .. }
                | Self::InvalidOperation { .. }
                | Self::IndexOutOfRange { .. }
        )
    }
}
