use std::path::PathBuf;

use thiserror::Error;

use crate::report::RunReport;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input directory does not exist: {}", .0.display())]
    InputDirMissing(PathBuf),
    #[error("output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
    #[error("Image error in {key}: {source}")]
    Image {
        key: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Invalid dimensions: {width}x{height} (both must be > 0)")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Sprite {key} ({width}x{height}) does not fit the atlas bounds {max_width}x{max_height}")]
    OutOfSpace {
        key: String,
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Template error: {0}")]
    Template(String),
    #[error("Settings error in {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
    #[error("Plugin {plugin} failed: {message}")]
    Plugin { plugin: String, message: String },
    #[error("Task failed: {0}")]
    Task(String),
    /// Strict runs only; the report still lists every outcome.
    #[error(
        "{} configuration(s) and {} file write(s) failed",
        .report.failed_configurations(),
        .report.failed_files()
    )]
    PartialFailure { report: Box<RunReport> },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<handlebars::RenderError> for PipelineError {
    fn from(e: handlebars::RenderError) -> Self {
        Self::Template(e.to_string())
    }
}

impl From<handlebars::TemplateError> for PipelineError {
    fn from(e: handlebars::TemplateError) -> Self {
        Self::Template(e.to_string())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
