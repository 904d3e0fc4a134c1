//! Console configuration
//!
//! A JSON file next to the binary, overridable from the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ConsoleError, ConsoleResult};
use crate::lifecycle::Permissions;

pub const ENV_API_URL: &str = "EVIDENCE_CONSOLE_API_URL";
pub const ENV_API_TOKEN: &str = "EVIDENCE_CONSOLE_API_TOKEN";
pub const ENV_PAGE_SIZE: &str = "EVIDENCE_CONSOLE_PAGE_SIZE";

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub page_size: u32,
    pub log_filter: String,
    /// Capabilities the CLI acts with, keyed by bucket.
    pub permissions: Permissions,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            api_token: None,
            page_size: 10,
            log_filter: "evidence_console=info".to_string(),
            permissions: Permissions::new(),
        }
    }
}

impl ConsoleConfig {
    pub fn validate(&self) -> ConsoleResult<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConsoleError::Config("api_base_url is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConsoleError::Config(format!(
                "api_base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConsoleError::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        Ok(())
    }

    pub fn apply_env(&mut self) -> ConsoleResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overrides from any key lookup; blank values are ignored.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConsoleResult<()> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_API_URL) {
            debug!("{} overrides api_base_url", ENV_API_URL);
            self.api_base_url = url;
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(size) = get(ENV_PAGE_SIZE) {
            self.page_size = size
                .parse()
                .map_err(|_| ConsoleError::Config(format!("{} is not a number: '{}'", ENV_PAGE_SIZE, size)))?;
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the file, writing the default first if it does not exist.
    pub async fn load(&self) -> ConsoleResult<ConsoleConfig> {
        if !self.path.exists() {
            let default = ConsoleConfig::default();
            self.save(&default).await?;
            info!("Wrote default config to {}", self.path.display());
            return Ok(default);
        }
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConsoleError::Config(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConsoleError::Config(format!("{}: {}", self.path.display(), e)))
    }

    pub async fn save(&self, config: &ConsoleConfig) -> ConsoleResult<()> {
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ConsoleError::Config(e.to_string()))?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| ConsoleError::Config(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{Capability, CapabilitySet, EVIDENCE_BUCKET};
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_path_buf());

        let config = ConsoleConfig {
            api_base_url: "https://grc.example.com/api".to_string(),
            api_token: Some("tok".to_string()),
            page_size: 25,
            permissions: Permissions::new().with_bucket(EVIDENCE_BUCKET, CapabilitySet::all()),
            ..Default::default()
        };

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();
        assert_eq!(config, loaded);
        assert!(loaded.permissions.allows(EVIDENCE_BUCKET, Capability::Update));
    }

    #[tokio::test]
    async fn test_missing_file_writes_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("console.json");
        let manager = ConfigManager::new(path.clone());

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded, ConsoleConfig::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("console.json");
        std::fs::write(&path, r#"{"page_size": 50}"#).unwrap();

        let loaded = ConfigManager::new(path).load().await.unwrap();
        assert_eq!(loaded.page_size, 50);
        assert_eq!(loaded.log_filter, "evidence_console=info");
    }

    #[test]
    fn test_vars_override_and_blank_is_ignored() {
        let vars: HashMap<&str, &str> = [(ENV_API_URL, "https://x.example"), (ENV_API_TOKEN, "  "), (ENV_PAGE_SIZE, "20")]
            .into_iter()
            .collect();
        let mut config = ConsoleConfig::default();
        config.apply_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_base_url, "https://x.example");
        assert_eq!(config.api_token, None);
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_bad_page_size_var() {
        let mut config = ConsoleConfig::default();
        let err = config
            .apply_vars(|k| (k == ENV_PAGE_SIZE).then(|| "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
    }

    #[test]
    fn test_validation() {
        assert!(ConsoleConfig::default().validate().is_ok());

        let bad_url = ConsoleConfig { api_base_url: "ftp://files".to_string(), ..Default::default() };
        assert!(bad_url.validate().is_err());

        let zero = ConsoleConfig { page_size: 0, ..Default::default() };
        assert!(zero.validate().is_err());

        let too_big = ConsoleConfig { page_size: 101, ..Default::default() };
        assert!(too_big.validate().is_err());
    }
}
