//! Build-tool lifecycle adapter.
//!
//! Hosts drive plugins through [`BuildPlugin`]: `config_resolved` once the
//! build configuration is final, then `resolve_id`/`load` for module requests.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::{PipelineError, Result};
use crate::report::RunReport;
use crate::run::PipelineRun;

/// Module id served by [`TexturePackerPlugin`].
pub const VIRTUAL_MODULE_ID: &str = "virtual-module";

/// Source returned when [`VIRTUAL_MODULE_ID`] is loaded.
pub const VIRTUAL_MODULE_SOURCE: &str = r#"export default "This is virtual!""#;

/// Hooks a build host calls on a plugin.
#[async_trait]
pub trait BuildPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Called after the host resolved its configuration; the host awaits it.
    async fn config_resolved(&self) -> Result<()> {
        Ok(())
    }

    /// Claims a module id, returning the resolved id.
    fn resolve_id(&self, _source: &str) -> Option<String> {
        None
    }

    /// Returns module source for an id this plugin resolved.
    fn load(&self, _id: &str) -> Option<String> {
        None
    }
}

/// Packs texture atlases when the host configuration resolves.
///
/// The pipeline runs at most once per plugin instance: repeated
/// `config_resolved` calls share the first outcome.
#[derive(Debug)]
pub struct TexturePackerPlugin {
    run: PipelineRun,
    outcome: OnceCell<std::result::Result<RunReport, String>>,
}

impl TexturePackerPlugin {
    pub const NAME: &'static str = "texbake-texture-packer";

    pub fn new(run: PipelineRun) -> Self {
        Self {
            run,
            outcome: OnceCell::new(),
        }
    }

    /// Report of the completed run, if it has finished successfully.
    pub fn report(&self) -> Option<&RunReport> {
        self.outcome.get().and_then(|o| o.as_ref().ok())
    }
}

#[async_trait]
impl BuildPlugin for TexturePackerPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn config_resolved(&self) -> Result<()> {
        let outcome = self
            .outcome
            .get_or_init(|| async { self.run.run().await.map_err(|e| e.to_string()) })
            .await;
        match outcome {
            Ok(_) => Ok(()),
            Err(message) => Err(PipelineError::Plugin {
                plugin: Self::NAME.to_string(),
                message: message.clone(),
            }),
        }
    }

    fn resolve_id(&self, source: &str) -> Option<String> {
        (source == VIRTUAL_MODULE_ID).then(|| VIRTUAL_MODULE_ID.to_string())
    }

    fn load(&self, id: &str) -> Option<String> {
        (id == VIRTUAL_MODULE_ID).then(|| VIRTUAL_MODULE_SOURCE.to_string())
    }
}
