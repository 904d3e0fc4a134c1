use std::sync::Arc;
use tracing::info;

use crate::api::{endpoints, ApiRequest, Backend};
use crate::error::ConsoleResult;
use crate::inventory::{AssetKind, InventoryAsset};
use crate::lifecycle::{Capability, Permissions};

/// Edit/delete for models, agents and datasets.
pub struct InventoryService {
    backend: Arc<dyn Backend>,
}

impl InventoryService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// PUTs the asset's name and attributes to its kind's endpoint.
    pub async fn update(&self, perms: &Permissions, asset: &InventoryAsset) -> ConsoleResult<()> {
        perms.require(asset.kind.bucket(), Capability::Update)?;
        self.backend
            .send(ApiRequest::put(endpoints::inventory_asset(asset.kind, &asset.doc_id), asset.update_body()))
            .await?
            .ensure_success()?;
        info!("Updated {} {}", asset.kind, asset.doc_id);
        Ok(())
    }

    pub async fn delete(&self, perms: &Permissions, kind: AssetKind, doc_id: &str) -> ConsoleResult<()> {
        perms.require(kind.bucket(), Capability::Delete)?;
        self.backend
            .send(ApiRequest::delete(endpoints::inventory_asset(kind, doc_id)))
            .await?
            .ensure_success()?;
        info!("Deleted {} {}", kind, doc_id);
        Ok(())
    }
}
