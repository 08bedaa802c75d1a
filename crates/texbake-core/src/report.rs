use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What `run()` does when some configurations or writes failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record failures in the report and return `Ok`.
    #[default]
    Lenient,
    /// Return `PipelineError::PartialFailure` once every task has settled.
    Strict,
}

/// Result of writing one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub path: PathBuf,
    /// Bytes written, or the rendered write error.
    pub result: Result<usize, String>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationOutcome {
    Packed { files: Vec<FileReport> },
    Failed { error: String },
}

/// Outcome of one configuration, identified by its position in the input set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationReport {
    pub index: usize,
    pub outcome: ConfigurationOutcome,
}

impl ConfigurationReport {
    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            outcome: ConfigurationOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ConfigurationOutcome::Failed { .. })
    }

    /// Per-file results; empty for a failed configuration.
    pub fn files(&self) -> &[FileReport] {
        match &self.outcome {
            ConfigurationOutcome::Packed { files } => files,
            ConfigurationOutcome::Failed { .. } => &[],
        }
    }
}

/// Everything a run produced, ordered by configuration index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub assets: usize,
    pub configurations: Vec<ConfigurationReport>,
}

impl RunReport {
    pub fn failed_configurations(&self) -> usize {
        self.configurations.iter().filter(|c| c.is_failed()).count()
    }

    pub fn failed_files(&self) -> usize {
        self.files().filter(|f| !f.is_ok()).count()
    }

    pub fn files_written(&self) -> usize {
        self.files().filter(|f| f.is_ok()).count()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileReport> {
        self.configurations.iter().flat_map(|c| c.files())
    }

    pub fn is_success(&self) -> bool {
        self.failed_configurations() == 0 && self.failed_files() == 0
    }

    /// One-line human summary, in the spirit of `PackStats::summary`.
    pub fn summary(&self) -> String {
        format!(
            "Assets: {}, Configurations: {} ({} failed), Files: {} written, {} failed",
            self.assets,
            self.configurations.len(),
            self.failed_configurations(),
            self.files_written(),
            self.failed_files(),
        )
    }
}
