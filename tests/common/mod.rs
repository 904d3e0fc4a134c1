#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use evidence_console::api::{ApiRequest, ApiResponse, Backend, BlobStore, UploadFile};
use evidence_console::error::{ConsoleError, ConsoleResult};
use evidence_console::lifecycle::{CapabilitySet, Permissions, EVIDENCE_BUCKET, KNOWLEDGE_BUCKET};

/// Replays queued responses in order and records every request it sees.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<ConsoleResult<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<ConsoleResult<ApiResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from(responses)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.requests.lock().await.iter().map(|r| r.path.clone()).collect()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn send(&self, request: ApiRequest) -> ConsoleResult<ApiResponse> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ConsoleError::Transport("no scripted response left".to_string())))
    }
}

/// Records PUTs; fails the one whose file name matches `fail_on`.
#[derive(Default)]
pub struct RecordingStore {
    pub fail_on: Option<String>,
    puts: Mutex<Vec<(String, String)>>,
}

impl RecordingStore {
    pub fn failing_on(name: &str) -> Arc<Self> {
        Arc::new(Self { fail_on: Some(name.to_string()), ..Default::default() })
    }

    pub async fn puts(&self) -> Vec<(String, String)> {
        self.puts.lock().await.clone()
    }
}

#[async_trait]
impl BlobStore for RecordingStore {
    async fn put_blob(&self, url: &str, file: &UploadFile) -> ConsoleResult<()> {
        self.puts.lock().await.push((url.to_string(), file.name.clone()));
        if self.fail_on.as_deref() == Some(file.name.as_str()) {
            return Err(ConsoleError::Backend { status: 403, message: "Signature expired".to_string() });
        }
        Ok(())
    }
}

pub fn ok(results: Value) -> ConsoleResult<ApiResponse> {
    Ok(ApiResponse::ok(results))
}

pub fn status(code: u16, results: Value) -> ConsoleResult<ApiResponse> {
    Ok(ApiResponse { status: code, results })
}

pub fn ticket(doc_id: &str, urls: usize) -> ConsoleResult<ApiResponse> {
    let blob_url: Vec<String> = (0..urls).map(|i| format!("https://blob.example/{}/{}", doc_id, i)).collect();
    ok(json!({ "doc_id": doc_id, "blob_url": blob_url }))
}

pub fn files(names: &[&str]) -> Vec<UploadFile> {
    names.iter().map(|n| UploadFile::new(*n, Some("application/pdf"), b"%PDF".to_vec())).collect()
}

pub fn reviewer() -> Permissions {
    Permissions::new()
        .with_bucket(EVIDENCE_BUCKET, CapabilitySet::all())
        .with_bucket(KNOWLEDGE_BUCKET, CapabilitySet::all())
}

pub fn viewer() -> Permissions {
    Permissions::new()
        .with_bucket(EVIDENCE_BUCKET, CapabilitySet::read_only())
        .with_bucket(KNOWLEDGE_BUCKET, CapabilitySet::read_only())
}

/// One evidence group as the list endpoint returns it.
pub fn group_json(name: &str, versions: &[(&str, &str, &str, &str)]) -> Value {
    let versions: Vec<Value> = versions
        .iter()
        .map(|(doc_id, version, file_name, status)| {
            json!({ "doc_id": doc_id, "version": version, "file_names": [file_name], "status": status })
        })
        .collect();
    json!({ "name": name, "control_id": "CC6.1", "versions": versions })
}

pub fn page_json(groups: Vec<Value>) -> Value {
    json!({ "total": groups.len(), "page": 1, "items": groups })
}
