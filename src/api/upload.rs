//! Two-phase upload: the backend hands out pre-signed URLs, files go straight
//! to storage one at a time, and only then is the upload confirmed.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info, warn};

use super::BlobStore;
use crate::error::{ConsoleError, ConsoleResult};

pub const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";
pub const BLOB_TYPE_VALUE: &str = "BlockBlob";
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    /// Reads a local file; the MIME type is guessed from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> ConsoleResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConsoleError::validation("files", format!("Not a file: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ConsoleError::validation("files", format!("Cannot read {}: {}", path.display(), e)))?;
        let content_type = guess_content_type(&name);
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn mime_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }

    /// Metadata sent to the backend when asking for an upload URL.
    pub fn descriptor(&self) -> Value {
        json!({
            "file_name": self.name,
            "content_type": self.mime_type(),
            "size": self.bytes.len(),
        })
    }
}

fn guess_content_type(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(mime)
}

/// What the backend returns when an upload is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTicket {
    pub doc_id: String,
    #[serde(rename = "blob_url", default)]
    pub blob_urls: Vec<String>,
}

pub fn require_files(files: &[UploadFile]) -> ConsoleResult<()> {
    if files.is_empty() {
        return Err(ConsoleError::validation("files", "At least one file is required"));
    }
    Ok(())
}

/// PUTs every file in order. The first failure aborts the rest; files already
/// stored stay where they are.
pub async fn upload_all(store: &dyn BlobStore, urls: &[String], files: &[UploadFile]) -> ConsoleResult<()> {
    require_files(files)?;
    if urls.len() != files.len() {
        return Err(ConsoleError::validation(
            "files",
            format!("Expected {} upload URLs, got {}", files.len(), urls.len()),
        ));
    }

    for (index, (url, file)) in urls.iter().zip(files).enumerate() {
        debug!("Uploading {} ({} bytes, {})", file.name, file.bytes.len(), file.mime_type());
        if let Err(e) = store.put_blob(url, file).await {
            warn!("Upload of {} failed, skipping {} remaining", file.name, files.len() - index - 1);
            return Err(ConsoleError::UploadAborted {
                file: file.name.clone(),
                index,
                reason: e.user_message(),
            });
        }
    }
    info!("Uploaded {} file(s)", files.len());
    Ok(())
}
