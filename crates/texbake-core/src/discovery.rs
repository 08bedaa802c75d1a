//! Asset discovery: walk the input root, match patterns, read bytes concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::task::JoinSet;
use walkdir::{DirEntry, WalkDir};

use crate::error::{PipelineError, Result};
use crate::model::AssetRecord;
use crate::observer::{PipelineEvent, PipelineObserver};

/// Pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = "**/*.png";

/// Compiles `patterns` into a matcher; an empty list means [`DEFAULT_PATTERN`].
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    if patterns.is_empty() {
        builder.add(Glob::new(DEFAULT_PATTERN)?);
    }
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

/// Relative path of `path` under `root`, with `/` separators.
fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Names starting with `.` below the root are skipped, along with everything
/// inside hidden directories.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Lists every file under `root` whose relative path matches `patterns`,
/// sorted by relative path.
///
/// Hidden entries are skipped. Symbolic links are listed but never followed,
/// so a matching link that cannot be read fails later, at read time.
pub fn find_assets(root: &Path, patterns: &[String]) -> Result<Vec<(String, PathBuf)>> {
    if !root.is_dir() {
        return Err(PipelineError::InputDirMissing(root.to_path_buf()));
    }
    let set = build_globset(patterns)?;
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let key = relative_key(root, entry.path());
        if set.is_match(&key) {
            found.push((key, entry.into_path()));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// Discovers and reads every matching asset under `root`.
///
/// Reads run concurrently; the first read error aborts discovery. The result
/// is sorted by relative path regardless of completion order.
pub async fn discover_assets(
    root: &Path,
    patterns: &[String],
    observer: &Arc<dyn PipelineObserver>,
) -> Result<Vec<AssetRecord>> {
    let root = root.to_path_buf();
    let pats = patterns.to_vec();
    let found = tokio::task::spawn_blocking(move || find_assets(&root, &pats)).await??;

    let mut reads: JoinSet<Result<AssetRecord>> = JoinSet::new();
    for (key, path) in found {
        let observer = observer.clone();
        reads.spawn(async move {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| PipelineError::io(&path, e))?;
            observer.on_event(PipelineEvent::AssetDiscovered {
                path: key.clone(),
                bytes: bytes.len(),
            });
            Ok(AssetRecord::new(key, bytes))
        });
    }

    let mut assets = Vec::with_capacity(reads.len());
    while let Some(res) = reads.join_next().await {
        // Dropping the set on early return aborts the remaining reads.
        assets.push(res??);
    }
    assets.sort_by(|a, b| a.path.cmp(&b.path));
    observer.on_event(PipelineEvent::DiscoveryCompleted {
        assets: assets.len(),
    });
    Ok(assets)
}
