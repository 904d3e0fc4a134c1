//! Backend API
//!
//! Request/response contract of the console backend and the blob store. Both
//! sit behind traits so services can be driven without a network.

pub mod endpoints;
mod http;
mod upload;

pub use http::{HttpBackend, REQUEST_ID_HEADER};
pub use upload::{require_files, upload_all, UploadFile, UploadTicket, BLOB_TYPE_HEADER, BLOB_TYPE_VALUE, FALLBACK_CONTENT_TYPE};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult, GENERIC_FAILURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub method: Method,
    /// Relative to the backend base URL, query string included.
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        Self { method, path: path.into(), body }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    #[serde(default)]
    pub results: Value,
}

impl ApiResponse {
    pub fn ok(results: Value) -> Self {
        Self { status: 200, results }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Non-2xx becomes `ConsoleError::Backend` carrying the backend's message.
    pub fn ensure_success(self) -> ConsoleResult<Value> {
        if self.is_success() {
            return Ok(self.results);
        }
        let message = ["message", "detail", "error"]
            .iter()
            .find_map(|key| self.results.get(*key).and_then(Value::as_str))
            .or_else(|| self.results.as_str())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        Err(ConsoleError::Backend {
            status: self.status,
            message,
        })
    }

    pub fn parse<T: DeserializeOwned>(self) -> ConsoleResult<T> {
        let results = self.ensure_success()?;
        Ok(serde_json::from_value(results)?)
    }
}

/// The console's REST backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ConsoleResult<ApiResponse>;
}

/// Direct-to-storage uploads through pre-signed URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_blob(&self, url: &str, file: &UploadFile) -> ConsoleResult<()>;
}
