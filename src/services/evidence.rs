//! Evidence Service
//!
//! Listing, two-phase uploads, new versions and review decisions against the
//! backend. Local copies are never edited in place; after a confirmed change
//! the board re-fetches the whole page. A failed re-fetch leaves the old page
//! in place and does not undo the change.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{endpoints, require_files, upload_all, ApiRequest, Backend, BlobStore, UploadFile, UploadTicket};
use crate::error::{ConsoleError, ConsoleResult};
use crate::evidence::{EvidenceGroup, EvidenceVersion, Recurrence, VersionDraft};
use crate::lifecycle::{
    authorize_decision, validate_comment, Capability, Decision, EvidenceStatus, Permissions, EVIDENCE_BUCKET,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceQuery {
    pub page: u32,
    pub limit: u32,
    pub control_id: Option<String>,
    pub keywords: Option<String>,
}

impl Default for EvidenceQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            control_id: None,
            keywords: None,
        }
    }
}

impl EvidenceQuery {
    pub fn path(&self) -> String {
        endpoints::evidence_list(
            self.page.max(1),
            self.limit,
            self.control_id.as_deref(),
            self.keywords.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidencePage {
    #[serde(default)]
    pub items: Vec<EvidenceGroup>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
}

/// Metadata for a brand-new evidence group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvidence {
    pub name: String,
    pub control_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub collected_by: String,
}

impl NewEvidence {
    fn validate(&self) -> ConsoleResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConsoleError::validation("name", "Evidence name is required"));
        }
        if self.control_id.trim().is_empty() {
            return Err(ConsoleError::validation("control_id", "A control is required"));
        }
        Ok(())
    }
}

const LOOKUP_PAGE_SIZE: u32 = 100;

pub struct EvidenceService {
    backend: Arc<dyn Backend>,
    blobs: Arc<dyn BlobStore>,
}

impl EvidenceService {
    pub fn new(backend: Arc<dyn Backend>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { backend, blobs }
    }

    pub async fn list(&self, query: &EvidenceQuery) -> ConsoleResult<EvidencePage> {
        self.backend.send(ApiRequest::get(query.path())).await?.parse()
    }

    /// Creates the group's first version. Returns the new doc id.
    pub async fn create(
        &self,
        perms: &Permissions,
        evidence: &NewEvidence,
        files: &[UploadFile],
    ) -> ConsoleResult<String> {
        perms.require(EVIDENCE_BUCKET, Capability::Create)?;
        evidence.validate()?;
        require_files(files)?;

        let body = json!({
            "name": evidence.name.trim(),
            "control_id": evidence.control_id,
            "description": evidence.description,
            "is_sensitive": evidence.is_sensitive,
            "recurrence": evidence.recurrence,
            "collected_by": evidence.collected_by,
            "files": files.iter().map(UploadFile::descriptor).collect::<Vec<_>>(),
        });
        let ticket: UploadTicket = self.backend.send(ApiRequest::post(endpoints::EVIDENCE, body)).await?.parse()?;
        info!("Registered evidence '{}' as {}", evidence.name, ticket.doc_id);

        self.finish_upload(ticket, &evidence.control_id, files).await
    }

    /// Uploads a new version under `group`. The draft's override, if any,
    /// wins over the resolved version.
    pub async fn create_version(
        &self,
        perms: &Permissions,
        group: &EvidenceGroup,
        draft: &VersionDraft,
        description: &str,
        files: &[UploadFile],
    ) -> ConsoleResult<String> {
        perms.require(EVIDENCE_BUCKET, Capability::Create)?;
        require_files(files)?;
        let parent = group
            .latest()
            .ok_or_else(|| ConsoleError::validation("parent_id", "Evidence group has no versions"))?;

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        let mut draft = draft.clone();
        draft.select_files(names.as_slice());
        let version = draft
            .version()
            .ok_or_else(|| ConsoleError::validation("version", "Version is required"))?
            .to_string();

        let body = json!({
            "parent_id": parent.id,
            "name": group.name,
            "control_id": group.control_id,
            "version": version,
            "description": description,
            "files": files.iter().map(UploadFile::descriptor).collect::<Vec<_>>(),
        });
        let ticket: UploadTicket = self
            .backend
            .send(ApiRequest::post(endpoints::EVIDENCE_CREATE_VERSION, body))
            .await?
            .parse()?;
        info!("Registered version {} of '{}' as {}", version, group.name, ticket.doc_id);

        self.finish_upload(ticket, &group.control_id, files).await
    }

    /// Sends an approve/reject decision. Nothing is sent unless the caller may
    /// update evidence, the comment is long enough, and the move is legal.
    pub async fn decide(
        &self,
        perms: &Permissions,
        version: &EvidenceVersion,
        control_id: &str,
        decision: Decision,
        comment: &str,
    ) -> ConsoleResult<EvidenceStatus> {
        let target = authorize_decision(perms, EVIDENCE_BUCKET, version.status, decision, comment)?;
        let body = json!({
            "doc_id": version.id,
            "control_id": control_id,
            "approval_status": decision.wire_status(),
            "comments": comment.trim(),
        });
        self.backend
            .send(ApiRequest::post(endpoints::EVIDENCE_APPROVE, body))
            .await?
            .ensure_success()?;
        info!("Evidence {} is now {}", version.id, target);
        Ok(target)
    }

    /// Looks the version up by id under `control_id` and decides on its
    /// stored status.
    pub async fn decide_by_id(
        &self,
        perms: &Permissions,
        control_id: &str,
        doc_id: &str,
        decision: Decision,
        comment: &str,
    ) -> ConsoleResult<EvidenceStatus> {
        perms.require(EVIDENCE_BUCKET, Capability::Update)?;
        validate_comment::<EvidenceStatus>(comment)?;

        let version = self.find_version(control_id, doc_id).await?;
        self.decide(perms, &version, control_id, decision, comment).await
    }

    async fn find_version(&self, control_id: &str, doc_id: &str) -> ConsoleResult<EvidenceVersion> {
        let mut query = EvidenceQuery {
            page: 1,
            limit: LOOKUP_PAGE_SIZE,
            control_id: Some(control_id.to_string()),
            keywords: None,
        };
        let mut seen: u64 = 0;
        loop {
            let page = self.list(&query).await?;
            if let Some(found) = page.items.iter().find_map(|g| g.version(doc_id)) {
                return Ok(found.clone());
            }
            seen += page.items.len() as u64;
            if page.items.is_empty() || seen >= page.total {
                return Err(ConsoleError::validation(
                    "doc_id",
                    format!("No evidence version '{}' under control {}", doc_id, control_id),
                ));
            }
            query.page += 1;
        }
    }

    async fn finish_upload(&self, ticket: UploadTicket, control_id: &str, files: &[UploadFile]) -> ConsoleResult<String> {
        upload_all(self.blobs.as_ref(), &ticket.blob_urls, files).await?;
        self.backend
            .send(ApiRequest::post(
                endpoints::evidence_confirm_upload(&ticket.doc_id, control_id),
                json!({}),
            ))
            .await?
            .ensure_success()?;
        Ok(ticket.doc_id)
    }
}

/// The evidence table: the current query plus the last page fetched for it.
pub struct EvidenceBoard {
    service: EvidenceService,
    query: EvidenceQuery,
    page: Option<EvidencePage>,
}

impl EvidenceBoard {
    pub fn new(service: EvidenceService, query: EvidenceQuery) -> Self {
        Self { service, query, page: None }
    }

    pub fn page(&self) -> Option<&EvidencePage> {
        self.page.as_ref()
    }

    pub fn query(&self) -> &EvidenceQuery {
        &self.query
    }

    pub fn service(&self) -> &EvidenceService {
        &self.service
    }

    /// Replaces the page only when the fetch succeeds.
    pub async fn refresh(&mut self) -> ConsoleResult<&EvidencePage> {
        let page = self.service.list(&self.query).await?;
        let page = self.page.insert(page);
        Ok(&*page)
    }

    /// The change is already on the backend; a stale page is only logged.
    async fn refresh_after(&mut self, action: &str) {
        if let Err(e) = self.refresh().await {
            warn!("{} succeeded but the evidence list could not be reloaded: {}", action, e);
        }
    }

    /// New search terms start again from the first page.
    pub async fn search(&mut self, keywords: Option<String>) -> ConsoleResult<&EvidencePage> {
        let next = EvidenceQuery { page: 1, keywords, ..self.query.clone() };
        let previous = std::mem::replace(&mut self.query, next);
        match self.service.list(&self.query).await {
            Ok(page) => {
                let page = self.page.insert(page);
                Ok(&*page)
            }
            Err(e) => {
                self.query = previous;
                Err(e)
            }
        }
    }

    pub fn group(&self, name: &str) -> Option<&EvidenceGroup> {
        self.page.as_ref()?.items.iter().find(|g| g.name == name)
    }

    pub async fn upload(
        &mut self,
        perms: &Permissions,
        evidence: &NewEvidence,
        files: &[UploadFile],
    ) -> ConsoleResult<String> {
        let doc_id = self.service.create(perms, evidence, files).await?;
        self.refresh_after("Upload").await;
        Ok(doc_id)
    }

    pub async fn upload_version(
        &mut self,
        perms: &Permissions,
        group: &EvidenceGroup,
        draft: &VersionDraft,
        description: &str,
        files: &[UploadFile],
    ) -> ConsoleResult<String> {
        let doc_id = self.service.create_version(perms, group, draft, description, files).await?;
        self.refresh_after("New version").await;
        Ok(doc_id)
    }

    pub async fn decide(
        &mut self,
        perms: &Permissions,
        version: &EvidenceVersion,
        control_id: &str,
        decision: Decision,
        comment: &str,
    ) -> ConsoleResult<EvidenceStatus> {
        let status = self.service.decide(perms, version, control_id, decision, comment).await?;
        self.refresh_after("Decision").await;
        Ok(status)
    }
}
