//! One pipeline invocation: preflight, discovery, configuration fan-out, persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::PackingConfiguration;
use crate::discovery::discover_assets;
use crate::engine::{AtlasEngine, TexEngine};
use crate::error::{PipelineError, Result};
use crate::model::AssetRecord;
use crate::observer::{PipelineEvent, PipelineObserver, TracingObserver};
use crate::persist::persist_outputs;
use crate::report::{ConfigurationOutcome, ConfigurationReport, FailurePolicy, RunReport};

/// The configurations to pack: a single value or a list, as written in
/// settings files. An empty list packs once with the engine's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigurationSet {
    Many(Vec<PackingConfiguration>),
    One(PackingConfiguration),
}

impl Default for ConfigurationSet {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl ConfigurationSet {
    /// Engine inputs, one per configuration run.
    pub fn to_engine_inputs(&self) -> Vec<Option<PackingConfiguration>> {
        match self {
            Self::One(cfg) => vec![Some(cfg.clone())],
            Self::Many(list) if list.is_empty() => vec![None],
            Self::Many(list) => list.iter().cloned().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(list) => list.len().max(1),
        }
    }

    /// Always false: an empty list still packs once.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl From<PackingConfiguration> for ConfigurationSet {
    fn from(cfg: PackingConfiguration) -> Self {
        Self::One(cfg)
    }
}

impl From<Vec<PackingConfiguration>> for ConfigurationSet {
    fn from(list: Vec<PackingConfiguration>) -> Self {
        Self::Many(list)
    }
}

/// Knobs that shape a run but not the packing itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub policy: FailurePolicy,
    /// Create the output directory instead of failing when it is missing.
    pub create_output_dir: bool,
    /// Upper bound on configurations packed at once; `None` (or 0) is unbounded.
    pub max_concurrency: Option<usize>,
    /// Discovery globs relative to the input root; empty means `**/*.png`.
    pub patterns: Vec<String>,
}

/// A single pipeline invocation.
///
/// ```no_run
/// use texbake_core::prelude::*;
/// # async fn demo() -> texbake_core::Result<()> {
/// let report = PipelineRun::new("assets", "dist")
///     .with_configurations(vec![
///         PackingConfiguration::builder().texture_name("ui").build(),
///         PackingConfiguration::builder().texture_name("ui-small").scale(0.5, ScaleMethod::Bilinear).build(),
///     ])
///     .run()
///     .await?;
/// println!("{}", report.summary());
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct PipelineRun {
    input_dir: PathBuf,
    output_dir: PathBuf,
    configurations: ConfigurationSet,
    options: RunOptions,
    engine: Arc<dyn AtlasEngine>,
    observer: Arc<dyn PipelineObserver>,
}

impl std::fmt::Debug for PipelineRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRun")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("configurations", &self.configurations.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PipelineRun {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            configurations: ConfigurationSet::default(),
            options: RunOptions::default(),
            engine: Arc::new(TexEngine),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_configurations(mut self, set: impl Into<ConfigurationSet>) -> Self {
        self.configurations = set.into();
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn AtlasEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.options.policy = policy;
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn configurations(&self) -> &ConfigurationSet {
        &self.configurations
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs the pipeline to completion.
    ///
    /// Fatal errors (missing directories, discovery failures) return early,
    /// before any engine call. Configuration and write failures are recorded
    /// in the report; under [`FailurePolicy::Strict`] they become
    /// [`PipelineError::PartialFailure`] carrying the full report once
    /// everything has settled.
    pub async fn run(&self) -> Result<RunReport> {
        self.prepare_output_dir().await?;
        let assets: Arc<[AssetRecord]> =
            discover_assets(&self.input_dir, &self.options.patterns, &self.observer)
                .await?
                .into();

        let report = self.fan_out(assets).await;
        self.observer.on_event(PipelineEvent::RunCompleted {
            configurations: report.configurations.len(),
            failed_configurations: report.failed_configurations(),
            files_written: report.files_written(),
            failed_files: report.failed_files(),
        });

        match self.options.policy {
            FailurePolicy::Strict if !report.is_success() => Err(PipelineError::PartialFailure {
                report: Box::new(report),
            }),
            _ => Ok(report),
        }
    }

    async fn prepare_output_dir(&self) -> Result<()> {
        if self.output_dir.is_dir() {
            return Ok(());
        }
        if self.options.create_output_dir {
            tokio::fs::create_dir_all(&self.output_dir)
                .await
                .map_err(|e| PipelineError::io(&self.output_dir, e))
        } else {
            Err(PipelineError::OutputDirMissing(self.output_dir.clone()))
        }
    }

    async fn fan_out(&self, assets: Arc<[AssetRecord]>) -> RunReport {
        let inputs = self.configurations.to_engine_inputs();
        let total = inputs.len();
        let limit = self
            .options
            .max_concurrency
            .filter(|&n| n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));

        let mut tasks: JoinSet<ConfigurationReport> = JoinSet::new();
        for (index, config) in inputs.into_iter().enumerate() {
            let assets = assets.clone();
            let engine = self.engine.clone();
            let observer = self.observer.clone();
            let output_dir = self.output_dir.clone();
            let limit = limit.clone();
            tasks.spawn(async move {
                let _permit = match limit {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                let texture_name = config
                    .as_ref()
                    .map(|c| c.texture_name.clone())
                    .unwrap_or_else(|| PackingConfiguration::default().texture_name);
                observer.on_event(PipelineEvent::ConfigurationStarted {
                    index,
                    texture_name,
                });

                match engine.pack(assets, config).await {
                    Ok(files) => {
                        observer.on_event(PipelineEvent::ConfigurationPacked {
                            index,
                            files: files.len(),
                        });
                        let files = persist_outputs(&output_dir, files, &observer).await;
                        ConfigurationReport {
                            index,
                            outcome: ConfigurationOutcome::Packed { files },
                        }
                    }
                    Err(e) => {
                        observer.on_event(PipelineEvent::ConfigurationFailed {
                            index,
                            error: e.to_string(),
                        });
                        ConfigurationReport::failed(index, e.to_string())
                    }
                }
            });
        }

        let mut slots: Vec<Option<ConfigurationReport>> = vec![None; total];
        while let Some(res) = tasks.join_next().await {
            // A panicked task leaves its slot empty; it is filled in below.
            if let Ok(report) = res {
                let i = report.index;
                slots[i] = Some(report);
            }
        }

        let configurations = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let error = "configuration task panicked".to_string();
                    self.observer.on_event(PipelineEvent::ConfigurationFailed {
                        index,
                        error: error.clone(),
                    });
                    ConfigurationReport::failed(index, error)
                })
            })
            .collect();

        RunReport {
            assets: assets.len(),
            configurations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_means_one_default_run() {
        assert_eq!(ConfigurationSet::default().to_engine_inputs(), vec![None]);
        let one = ConfigurationSet::from(PackingConfiguration::default());
        assert_eq!(one.to_engine_inputs().len(), 1);
        let many = ConfigurationSet::from(vec![PackingConfiguration::default(); 3]);
        assert_eq!(many.len(), 3);
    }

    #[test]
    fn configuration_set_accepts_object_or_array() {
        let one: ConfigurationSet =
            serde_json::from_str(r#"{"textureName": "a", "padding": 2}"#).unwrap();
        assert!(matches!(one, ConfigurationSet::One(ref c) if c.texture_name == "a" && c.padding == 2));
        let many: ConfigurationSet =
            serde_json::from_str(r#"[{"textureName": "a"}, {"textureName": "b"}]"#).unwrap();
        assert!(matches!(many, ConfigurationSet::Many(ref v) if v.len() == 2));
    }
}
