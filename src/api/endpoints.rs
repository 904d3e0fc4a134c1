//! Backend paths. Query values are percent-encoded.

use urlencoding::encode;

use crate::inventory::AssetKind;

pub const EVIDENCE: &str = "evidence";
pub const EVIDENCE_CREATE_VERSION: &str = "evidence/create-version";
pub const EVIDENCE_APPROVE: &str = "evidence/approve-evidence";
pub const KNOWLEDGE_COLLECTIONS: &str = "knowledge/collections";
pub const KNOWLEDGE_COLLECTION: &str = "knowledge/collection";
pub const KNOWLEDGE_DOCUMENT_UPLOAD: &str = "knowledge/document/upload";

/// `model?doc_id=` and friends.
pub fn inventory_asset(kind: AssetKind, doc_id: &str) -> String {
    format!("{}?doc_id={}", kind.path_segment(), encode(doc_id))
}

pub fn evidence_confirm_upload(doc_id: &str, control_id: &str) -> String {
    format!(
        "evidence/confirm-upload?doc_id={}&control_id={}",
        encode(doc_id),
        encode(control_id)
    )
}

/// Paginated listing, always grouped by evidence name.
pub fn evidence_list(page: u32, limit: u32, control_id: Option<&str>, keywords: Option<&str>) -> String {
    let mut path = format!("evidences?page={}&limit={}", page, limit);
    if let Some(control_id) = control_id.filter(|c| !c.is_empty()) {
        path.push_str(&format!("&control_id={}", encode(control_id)));
    }
    path.push_str("&group_by_name=true");
    if let Some(keywords) = keywords.map(str::trim).filter(|k| !k.is_empty()) {
        path.push_str(&format!("&keywords={}", encode(keywords)));
    }
    path
}

pub fn knowledge_collection(collection_id: &str) -> String {
    format!("{}?collection_id={}", KNOWLEDGE_COLLECTION, encode(collection_id))
}

pub fn knowledge_documents(collection_id: &str) -> String {
    format!("knowledge/documents?collection_id={}", encode(collection_id))
}

pub fn knowledge_document(doc_id: &str) -> String {
    format!("knowledge/document?doc_id={}", encode(doc_id))
}

pub fn knowledge_confirm_upload(doc_id: &str) -> String {
    format!("knowledge/document/confirm-upload?doc_id={}", encode(doc_id))
}

pub fn knowledge_confirm_update(doc_id: &str) -> String {
    format!("knowledge/document/confirm-update?doc_id={}", encode(doc_id))
}
