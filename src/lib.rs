//! Evidence Console
//!
//! Client core for a governance and compliance console:
//! - Evidence versioning with automatic next-version resolution
//! - Review lifecycles for evidence and knowledge documents
//! - Two-phase uploads through pre-signed blob URLs
//! - Permission gates checked before any request is sent

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod evidence;
pub mod inventory;
pub mod knowledge;
pub mod lifecycle;
pub mod notify;
pub mod services;
pub mod utils;

// Re-exports for convenience
pub use config::{ConfigManager, ConsoleConfig};
pub use error::{ConsoleError, ConsoleResult};
pub use evidence::{resolve_next_version, VersionDraft, VersionResolution};
pub use lifecycle::{Decision, DocumentStatus, EvidenceStatus, Permissions};
pub use services::{EvidenceService, KnowledgeService};
