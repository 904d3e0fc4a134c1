use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::upload::{UploadFile, BLOB_TYPE_HEADER, BLOB_TYPE_VALUE};
use super::{ApiRequest, ApiResponse, Backend, BlobStore, Method};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};

/// Correlates client log lines with backend logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// reqwest-backed backend and blob store. No retries and no client-side
/// timeout beyond reqwest's defaults.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("evidence-console/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            token,
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.api_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: ApiRequest) -> ConsoleResult<ApiResponse> {
        let url = self.url(&request.path);
        let request_id = Uuid::new_v4().to_string();
        debug!("{} {} [{}]", request.method, url, request_id);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        }
        .header(REQUEST_ID_HEADER, request_id.as_str());
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        // The backend wraps payloads in `results`; anything else is taken whole.
        let results = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(mut map)) if map.contains_key("results") => {
                    map.remove("results").unwrap_or(Value::Null)
                }
                Ok(other) => other,
                Err(_) => Value::String(text),
            }
        };
        if !(200..300).contains(&status) {
            warn!("{} {} -> {} [{}]", request.method, request.path, status, request_id);
        }
        Ok(ApiResponse { status, results })
    }
}

#[async_trait]
impl BlobStore for HttpBackend {
    async fn put_blob(&self, url: &str, file: &UploadFile) -> ConsoleResult<()> {
        let response = self
            .client
            .put(url)
            .header(BLOB_TYPE_HEADER, BLOB_TYPE_VALUE)
            .header(CONTENT_TYPE, file.mime_type())
            .body(file.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::Backend {
                status: status.as_u16(),
                message: format!("Storage rejected {} ({})", file.name, status),
            });
        }
        Ok(())
    }
}
