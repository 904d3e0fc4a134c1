//! Capability buckets
//!
//! Per-bucket create/read/update/delete grants, checked client-side before an
//! action is allowed to reach the backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::{ConsoleError, ConsoleResult};

pub const EVIDENCE_BUCKET: &str = "evidence";
pub const KNOWLEDGE_BUCKET: &str = "knowledge";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Create => write!(f, "create"),
            Capability::Read => write!(f, "read"),
            Capability::Update => write!(f, "update"),
            Capability::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,
}

impl CapabilitySet {
    pub fn all() -> Self {
        Self { create: true, read: true, update: true, delete: true }
    }

    pub fn read_only() -> Self {
        Self { read: true, ..Self::default() }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Create => self.create,
            Capability::Read => self.read,
            Capability::Update => self.update,
            Capability::Delete => self.delete,
        }
    }
}

/// Grants keyed by bucket name. Unknown buckets grant nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions {
    buckets: HashMap<String, CapabilitySet>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>, set: CapabilitySet) -> Self {
        self.buckets.insert(bucket.into(), set);
        self
    }

    pub fn grant(&mut self, bucket: impl Into<String>, set: CapabilitySet) {
        self.buckets.insert(bucket.into(), set);
    }

    pub fn allows(&self, bucket: &str, capability: Capability) -> bool {
        self.buckets
            .get(bucket)
            .map(|set| set.allows(capability))
            .unwrap_or(false)
    }

    /// Fails with `PermissionDenied` when the grant is missing.
    pub fn require(&self, bucket: &str, capability: Capability) -> ConsoleResult<()> {
        if self.allows(bucket, capability) {
            return Ok(());
        }
        warn!("Blocked '{}' on bucket '{}': capability not granted", capability, bucket);
        Err(ConsoleError::PermissionDenied {
            bucket: bucket.to_string(),
            capability,
        })
    }
}
