//! Diagnostic events emitted while a pipeline runs.
//!
//! The pipeline never logs directly; it hands every event to a
//! [`PipelineObserver`]. [`TracingObserver`] is the default and turns events
//! into `tracing` records. Front ends can plug in their own sink (the CLI
//! drives a progress spinner this way).

use std::path::PathBuf;

use tracing::{debug, error, info};

/// Event emitted during a pipeline run.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// An asset matched the discovery patterns and was read.
    AssetDiscovered { path: String, bytes: usize },

    /// Discovery finished.
    DiscoveryCompleted { assets: usize },

    /// A configuration was handed to the engine.
    ConfigurationStarted { index: usize, texture_name: String },

    /// The engine returned output files for a configuration.
    ConfigurationPacked { index: usize, files: usize },

    /// The engine failed (or its task panicked) for a configuration.
    ConfigurationFailed { index: usize, error: String },

    /// An output file was written.
    FileWritten { path: PathBuf, bytes: usize },

    /// An output file could not be written.
    FileFailed { path: PathBuf, error: String },

    /// Every configuration and write has settled.
    RunCompleted {
        configurations: usize,
        failed_configurations: usize,
        files_written: usize,
        failed_files: usize,
    },
}

/// Receives pipeline events. Called concurrently from several tasks.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: PipelineEvent);
}

/// Logs events through `tracing`: failures at `error`, progress at `info`
/// and per-asset chatter at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::AssetDiscovered { path, bytes } => {
                debug!(%path, bytes, "found image");
            }
            PipelineEvent::DiscoveryCompleted { assets } => info!(assets, "discovery complete"),
            PipelineEvent::ConfigurationStarted {
                index,
                texture_name,
            } => debug!(index, %texture_name, "packing"),
            PipelineEvent::ConfigurationPacked { index, files } => {
                info!(index, files, "packed")
            }
            PipelineEvent::ConfigurationFailed { index, error } => {
                error!(index, %error, "configuration failed")
            }
            PipelineEvent::FileWritten { path, bytes } => {
                debug!(path = %path.display(), bytes, "wrote")
            }
            PipelineEvent::FileFailed { path, error } => {
                error!(path = %path.display(), %error, "write failed")
            }
            PipelineEvent::RunCompleted {
                configurations,
                failed_configurations,
                files_written,
                failed_files,
            } => info!(
                configurations,
                failed_configurations, files_written, failed_files, "run complete"
            ),
        }
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: PipelineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingObserver {
        events: Arc<Mutex<Vec<PipelineEvent>>>,
    }

    impl PipelineObserver for RecordingObserver {
        fn on_event(&self, event: PipelineEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn observers_are_object_safe_and_shareable() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Arc<dyn PipelineObserver>> = vec![
            Arc::new(RecordingObserver {
                events: events.clone(),
            }),
            Arc::new(NoopObserver),
            Arc::new(TracingObserver),
        ];
        for sink in &sinks {
            sink.on_event(PipelineEvent::DiscoveryCompleted { assets: 3 });
        }
        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
