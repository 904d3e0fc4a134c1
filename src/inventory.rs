//! AI inventory assets: models, agents, datasets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Model,
    Agent,
    Dataset,
}

impl AssetKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            AssetKind::Model => "model",
            AssetKind::Agent => "agent",
            AssetKind::Dataset => "dataset",
        }
    }

    /// Permission bucket guarding this kind; named like its path.
    pub fn bucket(&self) -> &'static str {
        self.path_segment()
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl std::str::FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "model" => Ok(AssetKind::Model),
            "agent" => Ok(AssetKind::Agent),
            "dataset" => Ok(AssetKind::Dataset),
            other => Err(format!("unknown asset kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAsset {
    pub kind: AssetKind,
    pub doc_id: String,
    pub name: String,
    /// Kind-specific fields, passed through untouched.
    #[serde(default)]
    pub attributes: Value,
}

impl InventoryAsset {
    /// Attributes with `name` set on top; non-object attributes are dropped.
    pub fn update_body(&self) -> Value {
        let mut body = match &self.attributes {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        body.insert("name".to_string(), Value::String(self.name.trim().to_string()));
        Value::Object(body)
    }
}
