//! Upload-dialog version state.
//!
//! Holds the suggested version while files are picked. Once the user types a
//! version by hand, file changes stop touching it until the dialog is reset.

use tracing::debug;

use super::version::{resolve_next_version, SemVer, VersionResolution};
use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone)]
pub struct VersionDraft {
    latest_version: String,
    latest_file_names: Vec<String>,
    suggestion: Option<VersionResolution>,
    manual_version: Option<String>,
}

impl VersionDraft {
    pub fn open(latest_version: impl Into<String>, latest_file_names: Vec<String>) -> Self {
        Self {
            latest_version: latest_version.into(),
            latest_file_names,
            suggestion: None,
            manual_version: None,
        }
    }

    /// Recomputes the suggestion for the current selection.
    pub fn select_files<S: AsRef<str>>(&mut self, names: &[S]) {
        if self.manual_version.is_some() {
            debug!("Version overridden by hand; keeping it across file changes");
            return;
        }
        if names.is_empty() {
            self.suggestion = None;
            return;
        }
        self.suggestion = Some(resolve_next_version(&self.latest_version, self.latest_file_names.as_slice(), names));
    }

    /// Sticky until `reset`.
    pub fn override_version(&mut self, version: &str) -> ConsoleResult<()> {
        let trimmed = version.trim();
        if SemVer::parse(trimmed).is_none() {
            return Err(ConsoleError::validation(
                "version",
                "Version must look like MAJOR.MINOR.PATCH",
            ));
        }
        self.manual_version = Some(trimmed.to_string());
        Ok(())
    }

    /// Dialog re-opened: forget the override and the selection.
    pub fn reset(&mut self) {
        self.manual_version = None;
        self.suggestion = None;
    }

    pub fn is_manual(&self) -> bool {
        self.manual_version.is_some()
    }

    pub fn suggestion(&self) -> Option<&VersionResolution> {
        self.suggestion.as_ref()
    }

    /// Version to submit, if any is known yet.
    pub fn version(&self) -> Option<&str> {
        self.manual_version
            .as_deref()
            .or_else(|| self.suggestion.as_ref().map(|s| s.version.as_str()))
    }

    pub fn latest_version(&self) -> &str {
        &self.latest_version
    }
}
