//! Console Errors
//!
//! Flat, UI-facing taxonomy. Every failure is terminal for the action that
//! raised it and is converted to a notice at the action boundary.

use thiserror::Error;

use crate::lifecycle::Capability;

/// Shown when an error carries no message of its own.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConsoleError {
    /// Field-level validation failure, shown inline under the field.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Checked before any network call; the request is never sent.
    #[error("You do not have permission to {capability} {bucket}")]
    PermissionDenied { bucket: String, capability: Capability },

    #[error("Cannot move from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// Non-2xx response from the console backend.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// A blob PUT failed; files after `index` were not attempted.
    #[error("Upload of '{file}' failed: {reason}")]
    UploadAborted { file: String, index: usize, reason: String },

    #[error("{0}")]
    Auth(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Message for a toast: the error's own text, or the generic fallback.
    pub fn user_message(&self) -> String {
        let message = match self {
            ConsoleError::Backend { message, .. } => message.trim().to_string(),
            ConsoleError::Transport(message) | ConsoleError::Auth(message) => {
                message.trim().to_string()
            }
            other => other.to_string(),
        };
        if message.is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ConsoleError::PermissionDenied { .. })
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ConsoleError::Backend {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => ConsoleError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Transport(format!("Malformed response: {}", err))
    }
}
