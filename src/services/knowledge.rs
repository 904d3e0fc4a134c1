use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::{endpoints, require_files, upload_all, ApiRequest, Backend, BlobStore, UploadFile, UploadTicket};
use crate::error::{ConsoleError, ConsoleResult};
use crate::knowledge::{KnowledgeCollection, KnowledgeDocument};
use crate::lifecycle::{authorize_decision, Capability, Decision, DocumentStatus, Lifecycle, Permissions, KNOWLEDGE_BUCKET};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CollectionDraft {
    fn validate(&self) -> ConsoleResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConsoleError::validation("name", "Collection name is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub collection_id: String,
    pub name: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    #[serde(default)]
    pub requires_approval: bool,
}

fn visible_by_default() -> bool {
    true
}

/// Collection and document CRUD plus the same two-phase upload as evidence.
pub struct KnowledgeService {
    backend: Arc<dyn Backend>,
    blobs: Arc<dyn BlobStore>,
}

impl KnowledgeService {
    pub fn new(backend: Arc<dyn Backend>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { backend, blobs }
    }

    pub async fn collections(&self) -> ConsoleResult<Vec<KnowledgeCollection>> {
        self.backend
            .send(ApiRequest::get(endpoints::KNOWLEDGE_COLLECTIONS))
            .await?
            .parse()
    }

    pub async fn create_collection(&self, perms: &Permissions, draft: &CollectionDraft) -> ConsoleResult<KnowledgeCollection> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Create)?;
        draft.validate()?;
        let body = json!({ "name": draft.name.trim(), "description": draft.description });
        let created: KnowledgeCollection = self
            .backend
            .send(ApiRequest::post(endpoints::KNOWLEDGE_COLLECTION, body))
            .await?
            .parse()?;
        info!("Created collection {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn update_collection(
        &self,
        perms: &Permissions,
        collection_id: &str,
        draft: &CollectionDraft,
    ) -> ConsoleResult<()> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Update)?;
        draft.validate()?;
        let body = json!({ "name": draft.name.trim(), "description": draft.description });
        self.backend
            .send(ApiRequest::put(endpoints::knowledge_collection(collection_id), body))
            .await?
            .ensure_success()?;
        Ok(())
    }

    pub async fn delete_collection(&self, perms: &Permissions, collection_id: &str) -> ConsoleResult<()> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Delete)?;
        self.backend
            .send(ApiRequest::delete(endpoints::knowledge_collection(collection_id)))
            .await?
            .ensure_success()?;
        info!("Deleted collection {}", collection_id);
        Ok(())
    }

    pub async fn documents(&self, collection_id: &str) -> ConsoleResult<Vec<KnowledgeDocument>> {
        self.backend
            .send(ApiRequest::get(endpoints::knowledge_documents(collection_id)))
            .await?
            .parse()
    }

    pub async fn document(&self, doc_id: &str) -> ConsoleResult<KnowledgeDocument> {
        self.backend
            .send(ApiRequest::get(endpoints::knowledge_document(doc_id)))
            .await?
            .parse()
    }

    /// Metadata edit. Approved documents are refused before any request.
    pub async fn update_document(
        &self,
        perms: &Permissions,
        doc: &KnowledgeDocument,
        changes: serde_json::Value,
    ) -> ConsoleResult<()> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Update)?;
        doc.ensure_mutable()?;
        self.backend
            .send(ApiRequest::put(endpoints::knowledge_document(&doc.id), changes))
            .await?
            .ensure_success()?;
        Ok(())
    }

    pub async fn delete_document(&self, perms: &Permissions, doc: &KnowledgeDocument) -> ConsoleResult<()> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Delete)?;
        doc.ensure_mutable()?;
        self.backend
            .send(ApiRequest::delete(endpoints::knowledge_document(&doc.id)))
            .await?
            .ensure_success()?;
        info!("Deleted document {}", doc.id);
        Ok(())
    }

    /// New document: register, PUT each file, confirm-upload.
    pub async fn upload_document(
        &self,
        perms: &Permissions,
        doc: &NewDocument,
        files: &[UploadFile],
    ) -> ConsoleResult<String> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Create)?;
        if doc.name.trim().is_empty() {
            return Err(ConsoleError::validation("name", "Document name is required"));
        }
        require_files(files)?;
        let body = json!({
            "collection_id": doc.collection_id,
            "name": doc.name.trim(),
            "template_id": doc.template_id,
            "is_visible": doc.is_visible,
            "requires_approval": doc.requires_approval,
            "files": files.iter().map(UploadFile::descriptor).collect::<Vec<_>>(),
        });
        let ticket: UploadTicket = self
            .backend
            .send(ApiRequest::post(endpoints::KNOWLEDGE_DOCUMENT_UPLOAD, body))
            .await?
            .parse()?;
        upload_all(self.blobs.as_ref(), &ticket.blob_urls, files).await?;
        self.backend
            .send(ApiRequest::post(endpoints::knowledge_confirm_upload(&ticket.doc_id), json!({})))
            .await?
            .ensure_success()?;
        info!("Uploaded document {} into {}", ticket.doc_id, doc.collection_id);
        Ok(ticket.doc_id)
    }

    /// Replaces a document's content: register, PUT, confirm-update.
    pub async fn replace_document(
        &self,
        perms: &Permissions,
        doc: &KnowledgeDocument,
        files: &[UploadFile],
    ) -> ConsoleResult<()> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Update)?;
        doc.ensure_mutable()?;
        require_files(files)?;
        let body = json!({
            "doc_id": doc.id,
            "collection_id": doc.collection_id,
            "files": files.iter().map(UploadFile::descriptor).collect::<Vec<_>>(),
        });
        let ticket: UploadTicket = self
            .backend
            .send(ApiRequest::post(endpoints::KNOWLEDGE_DOCUMENT_UPLOAD, body))
            .await?
            .parse()?;
        upload_all(self.blobs.as_ref(), &ticket.blob_urls, files).await?;
        self.backend
            .send(ApiRequest::post(endpoints::knowledge_confirm_update(&doc.id), json!({})))
            .await?
            .ensure_success()?;
        Ok(())
    }

    /// draft -> reviewed.
    pub async fn mark_reviewed(&self, perms: &Permissions, doc: &KnowledgeDocument) -> ConsoleResult<DocumentStatus> {
        perms.require(KNOWLEDGE_BUCKET, Capability::Update)?;
        if !doc.status.can_transition(DocumentStatus::Reviewed) {
            return Err(ConsoleError::InvalidTransition {
                from: doc.status.to_string(),
                to: DocumentStatus::Reviewed.to_string(),
            });
        }
        self.put_status(doc, DocumentStatus::Reviewed, None).await
    }

    /// reviewed -> approved | rejected.
    pub async fn review(
        &self,
        perms: &Permissions,
        doc: &KnowledgeDocument,
        decision: Decision,
        comment: &str,
    ) -> ConsoleResult<DocumentStatus> {
        let target = authorize_decision(perms, KNOWLEDGE_BUCKET, doc.status, decision, comment)?;
        self.put_status(doc, target, Some(comment.trim())).await
    }

    async fn put_status(
        &self,
        doc: &KnowledgeDocument,
        status: DocumentStatus,
        comments: Option<&str>,
    ) -> ConsoleResult<DocumentStatus> {
        let body = json!({ "status": status, "comments": comments });
        self.backend
            .send(ApiRequest::put(endpoints::knowledge_document(&doc.id), body))
            .await?
            .ensure_success()?;
        info!("Document {} is now {}", doc.id, status);
        Ok(status)
    }
}
