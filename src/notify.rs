//! Action boundary
//!
//! Every user action ends in exactly one transient notice. Errors are never
//! fatal; they are logged and turned into a toast or an inline field message.

use serde::Serialize;
use std::future::Future;
use tracing::{info, warn};

use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Set for validation errors shown under a form field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into(), field: None }
    }

    pub fn from_error(err: &ConsoleError) -> Self {
        match err {
            ConsoleError::PermissionDenied { .. } => Self {
                level: NoticeLevel::Warning,
                message: err.user_message(),
                field: None,
            },
            ConsoleError::Validation { field, message } => Self {
                level: NoticeLevel::Error,
                message: message.clone(),
                field: Some(field.clone()),
            },
            other => Self {
                level: NoticeLevel::Error,
                message: other.user_message(),
                field: None,
            },
        }
    }
}

#[derive(Debug)]
pub struct ActionOutcome<T> {
    pub value: Option<T>,
    pub notice: Notice,
}

impl<T> ActionOutcome<T> {
    pub fn succeeded(&self) -> bool {
        self.value.is_some()
    }
}

/// Runs one action and converts its result into a notice.
pub async fn run_action<T, F>(label: &str, success_message: &str, action: F) -> ActionOutcome<T>
where
    F: Future<Output = ConsoleResult<T>>,
{
    match action.await {
        Ok(value) => {
            info!("{}: ok", label);
            ActionOutcome { value: Some(value), notice: Notice::success(success_message) }
        }
        Err(e) => {
            warn!("{}: {}", label, e);
            ActionOutcome { value: None, notice: Notice::from_error(&e) }
        }
    }
}
