use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::VersionDraft;
use super::version::SemVer;
use crate::error::{ConsoleError, ConsoleResult};
use crate::lifecycle::{
    authorize_decision, status_or_default, Capability, Decision, EvidenceStatus, Lifecycle, Permissions,
    EVIDENCE_BUCKET,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Upload,
    Approve,
    Reject,
}

impl From<Decision> for AuditAction {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approve => AuditAction::Approve,
            Decision::Reject => AuditAction::Reject,
        }
    }
}

/// One append-only trail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    pub action: AuditAction,
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: EvidenceStatus,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub comment: String,
    /// As reported by the backend.
    #[serde(default)]
    pub ip: Option<String>,
}

/// Who did it, from where, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor<'a> {
    pub name: &'a str,
    pub ip: Option<&'a str>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceVersion {
    #[serde(rename = "doc_id")]
    pub id: String,
    /// As stored by the backend; not guaranteed to be `MAJOR.MINOR.PATCH`.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub file_names: Vec<String>,
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: EvidenceStatus,
    #[serde(default)]
    pub collected_by: String,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    audit_trail: Vec<AuditTrailEntry>,
}

impl EvidenceVersion {
    pub fn new(id: impl Into<String>, version: impl Into<String>, file_names: Vec<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            file_names,
            status: EvidenceStatus::Draft,
            collected_by: String::new(),
            collected_at: None,
            reviewed_at: None,
            description: String::new(),
            is_sensitive: false,
            recurrence: None,
            audit_trail: Vec::new(),
        }
    }

    pub fn audit_trail(&self) -> &[AuditTrailEntry] {
        &self.audit_trail
    }

    /// `None` when the stored version is not `MAJOR.MINOR.PATCH`.
    pub fn semver(&self) -> Option<SemVer> {
        SemVer::parse(&self.version)
    }

    /// A submitted version carries at least one file and a strict version.
    pub fn validate_submitted(&self) -> ConsoleResult<()> {
        if self.status == EvidenceStatus::Draft {
            return Ok(());
        }
        if self.file_names.is_empty() {
            return Err(ConsoleError::validation("files", "At least one file is required"));
        }
        if self.semver().is_none() {
            return Err(ConsoleError::validation(
                "version",
                format!("'{}' is not MAJOR.MINOR.PATCH", self.version),
            ));
        }
        Ok(())
    }

    /// Files confirmed uploaded: draft -> pending.
    pub fn mark_uploaded(&mut self, actor: &Actor<'_>) -> ConsoleResult<&AuditTrailEntry> {
        if self.file_names.is_empty() {
            return Err(ConsoleError::validation("files", "At least one file is required"));
        }
        self.advance(EvidenceStatus::Pending, AuditAction::Upload, actor, String::new())
    }

    /// Applies an approve/reject decision and appends its trail entry.
    pub fn record_decision(
        &mut self,
        perms: &Permissions,
        decision: Decision,
        comment: &str,
        actor: &Actor<'_>,
    ) -> ConsoleResult<&AuditTrailEntry> {
        let target = authorize_decision(perms, EVIDENCE_BUCKET, self.status, decision, comment)?;
        self.reviewed_at = Some(actor.at);
        self.advance(target, decision.into(), actor, comment.trim().to_string())
    }

    fn advance(
        &mut self,
        target: EvidenceStatus,
        action: AuditAction,
        actor: &Actor<'_>,
        comment: String,
    ) -> ConsoleResult<&AuditTrailEntry> {
        if !self.status.can_transition(target) {
            return Err(ConsoleError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.audit_trail.push(AuditTrailEntry {
            action,
            status: target,
            actor: actor.name.to_string(),
            timestamp: actor.at,
            comment,
            ip: actor.ip.map(str::to_string),
        });
        Ok(&self.audit_trail[self.audit_trail.len() - 1])
    }
}

/// Table row for a group: the latest version's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub control_id: String,
    pub latest_doc_id: String,
    pub latest_version: String,
    pub status: EvidenceStatus,
    pub collected_by: String,
    pub collected_at: Option<DateTime<Utc>>,
    pub file_count: usize,
    pub version_count: usize,
}

/// All versions uploaded under one evidence name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceGroup {
    pub name: String,
    #[serde(default)]
    pub control_id: String,
    #[serde(default)]
    versions: Vec<EvidenceVersion>,
}

impl EvidenceGroup {
    /// A group exists once its first version is uploaded.
    pub fn from_first(name: impl Into<String>, control_id: impl Into<String>, first: EvidenceVersion) -> Self {
        Self {
            name: name.into(),
            control_id: control_id.into(),
            versions: vec![first],
        }
    }

    pub fn push_version(&mut self, version: EvidenceVersion) {
        self.versions.push(version);
    }

    pub fn versions(&self) -> &[EvidenceVersion] {
        &self.versions
    }

    /// Highest version; on ties the one appended last. Unparseable
    /// versions rank below every valid one.
    pub fn latest(&self) -> Option<&EvidenceVersion> {
        self.versions
            .iter()
            .fold(None, |best: Option<&EvidenceVersion>, v| match best {
                Some(b) if b.semver() > v.semver() => Some(b),
                _ => Some(v),
            })
    }

    pub fn version(&self, doc_id: &str) -> Option<&EvidenceVersion> {
        self.versions.iter().find(|v| v.id == doc_id)
    }

    /// Row visibility only. New versions stay uploadable even when the latest
    /// one is approved.
    pub fn can_add_version(&self, perms: &Permissions) -> bool {
        perms.allows(EVIDENCE_BUCKET, Capability::Create)
    }

    /// Version state for the "upload new version" dialog.
    pub fn open_version_draft(&self) -> VersionDraft {
        match self.latest() {
            Some(latest) => VersionDraft::open(latest.version.clone(), latest.file_names.clone()),
            None => VersionDraft::open(SemVer::INITIAL.to_string(), Vec::new()),
        }
    }

    pub fn summary(&self) -> Option<GroupSummary> {
        let latest = self.latest()?;
        Some(GroupSummary {
            name: self.name.clone(),
            control_id: self.control_id.clone(),
            latest_doc_id: latest.id.clone(),
            latest_version: latest.version.clone(),
            status: latest.status,
            collected_by: latest.collected_by.clone(),
            collected_at: latest.collected_at,
            file_count: latest.file_names.len(),
            version_count: self.versions.len(),
        })
    }
}
