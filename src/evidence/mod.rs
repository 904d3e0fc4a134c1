//! Evidence Module
//!
//! Versioned evidence submissions, their audit trail, and next-version
//! resolution.

mod draft;
mod model;
pub mod version;

pub use draft::VersionDraft;
pub use model::{
    Actor, AuditAction, AuditTrailEntry, EvidenceGroup, EvidenceVersion, GroupSummary, Recurrence,
};
pub use version::{
    increment_version, normalize_file_name, resolve_next_version, same_files, ChangeKind, SemVer,
    VersionResolution, DEFAULT_VERSION,
};
