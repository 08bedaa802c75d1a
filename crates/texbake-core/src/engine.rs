//! The packing engine seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PackingConfiguration;
use crate::error::Result;
use crate::model::{AssetRecord, OutputFile};
use crate::pack::pack_assets;

/// Turns an asset set plus one configuration into an ordered list of output files.
///
/// Implementations must be deterministic for identical inputs and must not
/// touch the filesystem; persistence is the caller's job. `config` is `None`
/// when the caller supplied no configuration at all.
#[async_trait]
pub trait AtlasEngine: Send + Sync {
    async fn pack(
        &self,
        assets: Arc<[AssetRecord]>,
        config: Option<PackingConfiguration>,
    ) -> Result<Vec<OutputFile>>;
}

/// Built-in engine backed by [`pack_assets`]. Packing runs on the blocking
/// pool so large atlases do not stall the runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TexEngine;

#[async_trait]
impl AtlasEngine for TexEngine {
    async fn pack(
        &self,
        assets: Arc<[AssetRecord]>,
        config: Option<PackingConfiguration>,
    ) -> Result<Vec<OutputFile>> {
        let cfg = config.unwrap_or_default();
        tokio::task::spawn_blocking(move || pack_assets(&assets, &cfg)).await?
    }
}
