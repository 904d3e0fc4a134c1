//! Review Lifecycle
//!
//! One place for status transitions, review guards, and which row actions a
//! caller may see for an item.

mod permissions;
mod status;

pub use permissions::{Capability, CapabilitySet, Permissions, EVIDENCE_BUCKET, KNOWLEDGE_BUCKET};
pub use status::{status_or_default, Decision, DocumentStatus, EvidenceStatus, Lifecycle};

use tracing::warn;

use crate::error::{ConsoleError, ConsoleResult};

/// Checks a reviewer decision without touching the network.
///
/// Order matters: a caller without `update` gets a permission warning even if
/// the comment is also missing.
pub fn authorize_decision<S: Lifecycle>(
    perms: &Permissions,
    bucket: &str,
    current: S,
    decision: Decision,
    comment: &str,
) -> ConsoleResult<S> {
    perms.require(bucket, Capability::Update)?;
    validate_comment::<S>(comment)?;

    let target = S::decided(decision);
    if !current.can_transition(target) {
        warn!("Rejected {} -> {} on '{}'", current, target, bucket);
        return Err(ConsoleError::InvalidTransition {
            from: current.to_string(),
            to: target.to_string(),
        });
    }
    Ok(target)
}

pub fn validate_comment<S: Lifecycle>(comment: &str) -> ConsoleResult<()> {
    let len = comment.trim().chars().count();
    if len == 0 {
        return Err(ConsoleError::validation("comments", "A comment is required"));
    }
    if len < S::MIN_COMMENT_LEN {
        return Err(ConsoleError::validation(
            "comments",
            format!("Comment must be at least {} characters", S::MIN_COMMENT_LEN),
        ));
    }
    Ok(())
}

/// Row actions visible for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemActions {
    pub view: bool,
    pub review: bool,
    pub update: bool,
    pub delete: bool,
    pub add_version: bool,
}

impl ItemActions {
    /// Approved items are closed for mutation from their own row.
    pub fn for_status<S: Lifecycle>(status: S, perms: &Permissions, bucket: &str) -> Self {
        let open = !status.is_approved();
        Self {
            view: perms.allows(bucket, Capability::Read),
            review: status.awaits_review() && perms.allows(bucket, Capability::Update),
            update: open && perms.allows(bucket, Capability::Update),
            delete: open && perms.allows(bucket, Capability::Delete),
            add_version: open && perms.allows(bucket, Capability::Create),
        }
    }
}
