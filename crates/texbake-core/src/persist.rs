//! Output persistence: every file is written independently.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::model::OutputFile;
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::report::FileReport;

/// Writes each file to `{output_dir}/{name}` concurrently.
///
/// A failed write is reported and recorded; it never stops the others.
/// Existing files are overwritten in place. Reports come back in input order.
pub async fn persist_outputs(
    output_dir: &Path,
    files: Vec<OutputFile>,
    observer: &Arc<dyn PipelineObserver>,
) -> Vec<FileReport> {
    let mut writes: JoinSet<(usize, FileReport)> = JoinSet::new();
    let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();

    for (i, file) in files.into_iter().enumerate() {
        let path = output_dir.join(&file.name);
        let observer = observer.clone();
        writes.spawn(async move {
            let result = match tokio::fs::write(&path, &file.buffer).await {
                Ok(()) => {
                    observer.on_event(PipelineEvent::FileWritten {
                        path: path.clone(),
                        bytes: file.buffer.len(),
                    });
                    Ok(file.buffer.len())
                }
                Err(e) => {
                    observer.on_event(PipelineEvent::FileFailed {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                    Err(e.to_string())
                }
            };
            (
                i,
                FileReport {
                    name: file.name,
                    path,
                    result,
                },
            )
        });
    }

    let mut slots: Vec<Option<FileReport>> = vec![None; names.len()];
    while let Some(res) = writes.join_next().await {
        if let Ok((i, report)) = res {
            slots[i] = Some(report);
        }
    }
    slots
        .into_iter()
        .zip(names)
        .map(|(slot, name)| {
            slot.unwrap_or_else(|| FileReport {
                path: output_dir.join(&name),
                name,
                result: Err("write task panicked".into()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;

    #[tokio::test]
    async fn one_bad_name_does_not_block_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let observer: Arc<dyn PipelineObserver> = Arc::new(NoopObserver);
        let files = vec![
            OutputFile::new("ok.json", b"{}".to_vec()),
            OutputFile::new("missing/sub/dir.json", b"{}".to_vec()),
            OutputFile::new("ok.png", vec![1, 2, 3]),
        ];
        let reports = persist_outputs(dir.path(), files, &observer).await;
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].result, Ok(2));
        assert!(reports[1].result.is_err());
        assert_eq!(reports[2].result, Ok(3));
        assert_eq!(std::fs::read(dir.path().join("ok.png")).unwrap(), vec![1, 2, 3]);
    }
}
