//! Knowledge Module
//!
//! Document collections. Reviews keep only the last reviewer and timestamp;
//! there is no per-document audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, ConsoleResult};
use crate::lifecycle::{
    authorize_decision, status_or_default, Capability, Decision, DocumentStatus, Lifecycle, Permissions,
    KNOWLEDGE_BUCKET,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeCollection {
    #[serde(rename = "collection_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub documents: Vec<KnowledgeDocument>,
}

impl KnowledgeCollection {
    pub fn document(&self, doc_id: &str) -> Option<&KnowledgeDocument> {
        self.documents.iter().find(|d| d.id == doc_id)
    }

    pub fn pending_review(&self) -> impl Iterator<Item = &KnowledgeDocument> {
        self.documents.iter().filter(|d| d.status.awaits_review())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(rename = "doc_id")]
    pub id: String,
    #[serde(default)]
    pub collection_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: DocumentStatus,
    #[serde(default = "default_document_version")]
    pub version: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

fn default_document_version() -> String {
    "1.0.0".to_string()
}

fn default_true() -> bool {
    true
}

impl KnowledgeDocument {
    pub fn new(id: impl Into<String>, collection_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection_id: collection_id.into(),
            name: name.into(),
            status: DocumentStatus::Draft,
            version: default_document_version(),
            template_id: None,
            is_visible: true,
            requires_approval: false,
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    /// Approved documents are closed for update, replace and delete.
    pub fn ensure_mutable(&self) -> ConsoleResult<()> {
        if self.status.is_approved() {
            return Err(ConsoleError::validation(
                "status",
                format!("'{}' is approved and can no longer be changed", self.name),
            ));
        }
        Ok(())
    }

    /// draft -> reviewed.
    pub fn mark_reviewed(&mut self, perms: &Permissions, reviewer: &str, at: DateTime<Utc>) -> ConsoleResult<()> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Update)?;
        if !self.status.can_transition(DocumentStatus::Reviewed) {
            return Err(ConsoleError::InvalidTransition {
                from: self.status.to_string(),
                to: DocumentStatus::Reviewed.to_string(),
            });
        }
        self.apply(DocumentStatus::Reviewed, reviewer, at);
        Ok(())
    }

    /// reviewed -> approved | rejected. The comment is validated but not kept.
    pub fn record_review(
        &mut self,
        perms: &Permissions,
        decision: Decision,
        comment: &str,
        reviewer: &str,
        at: DateTime<Utc>,
    ) -> ConsoleResult<DocumentStatus> {
        let target = authorize_decision(perms, KNOWLEDGE_BUCKET, self.status, decision, comment)?;
        self.apply(target, reviewer, at);
        Ok(target)
    }

    fn apply(&mut self, status: DocumentStatus, reviewer: &str, at: DateTime<Utc>) {
        self.status = status;
        self.reviewed_by = Some(reviewer.to_string());
        self.reviewed_at = Some(at);
    }
}
