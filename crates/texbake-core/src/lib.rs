//! Build-time sprite atlas pipeline.
//!
//! - Discovery: walk an input directory, match globs (`**/*.png` by default), read bytes concurrently
//! - Fan-out: pack the same asset set under several configurations at once, each failure isolated
//! - Persistence: write every output file independently; results land in a [`RunReport`]
//! - Engine: [`TexEngine`] packs with MaxRects, guillotine, or a portfolio of both, and exports
//!   JSON (hash/array/Pixi/Phaser) or handlebars-templated metadata
//!
//! Quick example:
//! ```ignore
//! use texbake_core::prelude::*;
//! # async fn demo() -> texbake_core::Result<()> {
//! let cfg = PackingConfiguration::builder()
//!     .texture_name("sprites")
//!     .with_max_dimensions(1024, 1024)
//!     .padding(2)
//!     .build();
//! let report = PipelineRun::new("assets", "dist")
//!     .with_configurations(cfg)
//!     .with_policy(FailurePolicy::Strict)
//!     .run()
//!     .await?;
//! println!("{}", report.summary());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod observer;
pub mod pack;
pub mod packer;
pub mod persist;
pub mod plugin;
pub mod report;
pub mod run;
pub mod settings;

pub use config::*;
pub use discovery::{DEFAULT_PATTERN, discover_assets};
pub use engine::{AtlasEngine, TexEngine};
pub use error::*;
pub use model::*;
pub use observer::{NoopObserver, PipelineEvent, PipelineObserver, TracingObserver};
pub use pack::{pack_assets, pack_atlas};
pub use persist::persist_outputs;
pub use plugin::{BuildPlugin, TexturePackerPlugin, VIRTUAL_MODULE_ID};
pub use report::*;
pub use run::{ConfigurationSet, PipelineRun, RunOptions};
pub use settings::PipelineSettings;

/// Convenience prelude for common types and functions.
/// Importing `texbake_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        BitmapFilterType, CustomExporter, Exporter, MaxRectsBinMethod, MaxRectsPackerMethod,
        PackerExporterType, PackerType, PackingConfiguration, PackingConfigurationBuilder,
        ScaleMethod, TextureFormat, TrimMode,
    };
    pub use crate::engine::{AtlasEngine, TexEngine};
    pub use crate::error::{PipelineError, Result};
    pub use crate::model::{AssetRecord, Atlas, Frame, Meta, OutputFile, Page, PackStats, Rect};
    pub use crate::observer::{PipelineEvent, PipelineObserver};
    pub use crate::plugin::{BuildPlugin, TexturePackerPlugin};
    pub use crate::report::{FailurePolicy, RunReport};
    pub use crate::run::{ConfigurationSet, PipelineRun, RunOptions};
    pub use crate::settings::PipelineSettings;
}
