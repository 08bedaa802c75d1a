//! Settings files: where to read, where to write, and how to pack.
//!
//! ```yaml
//! inputDir: assets/sprites
//! outputDir: public/atlas
//! strict: true
//! options:
//!   - textureName: ui
//!     padding: 2
//!   - textureName: ui-half
//!     scale: 0.5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::report::FailurePolicy;
use crate::run::{ConfigurationSet, PipelineRun, RunOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// One configuration object or a list of them.
    #[serde(default)]
    pub options: ConfigurationSet,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub create_output_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
}

impl PipelineSettings {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            options: ConfigurationSet::default(),
            strict: false,
            create_output_dir: false,
            max_concurrency: None,
            patterns: Vec::new(),
        }
    }

    /// Loads settings from a `.json`, `.yaml` or `.yml` file. Other extensions
    /// are parsed as YAML, which also accepts JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| PipelineError::Settings {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            policy: if self.strict {
                FailurePolicy::Strict
            } else {
                FailurePolicy::Lenient
            },
            create_output_dir: self.create_output_dir,
            max_concurrency: self.max_concurrency,
            patterns: self.patterns.clone(),
        }
    }

    /// Builds a run with the default engine and observer.
    pub fn to_pipeline_run(&self) -> PipelineRun {
        PipelineRun::new(&self.input_dir, &self.output_dir)
            .with_configurations(self.options.clone())
            .with_options(self.run_options())
    }
}
