use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use texbake_core::prelude::*;
use texbake_core::{NoopObserver, discover_assets};

fn write_png(root: &Path, rel: &str, w: u32, h: u32, color: [u8; 4]) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(w, h, Rgba(color)).save(&path).unwrap();
}

fn read_dir_bytes(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (
                e.file_name().to_string_lossy().into_owned(),
                std::fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

/// Emits `{textureName}.txt` listing the asset paths. Texture names steer it:
/// `boom` fails, `panic` panics, `slow*` sleeps first, `shared-*` writes `shared.txt`.
#[derive(Default)]
struct ScriptedEngine {
    calls: AtomicUsize,
}

#[async_trait]
impl AtlasEngine for ScriptedEngine {
    async fn pack(
        &self,
        assets: Arc<[AssetRecord]>,
        config: Option<PackingConfiguration>,
    ) -> texbake_core::Result<Vec<OutputFile>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = config.map_or_else(|| "default".to_string(), |c| c.texture_name);
        if name == "boom" {
            return Err(PipelineError::InvalidConfig("boom".into()));
        }
        if name == "panic" {
            panic!("engine exploded");
        }
        if name.contains("slow") {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        let listing = assets
            .iter()
            .map(|a| a.path.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let file_name = if name.starts_with("shared-") {
            "shared.txt".to_string()
        } else {
            format!("{name}.txt")
        };
        Ok(vec![OutputFile::new(file_name, format!("{name}\n{listing}"))])
    }
}

struct RecordingObserver(Mutex<Vec<PipelineEvent>>);

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: PipelineEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn named(names: &[&str]) -> Vec<PackingConfiguration> {
    names
        .iter()
        .map(|n| PackingConfiguration::builder().texture_name(*n).build())
        .collect()
}

#[tokio::test]
async fn discovery_finds_every_png_and_nothing_else() {
    let input = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [255, 0, 0, 255]);
    write_png(input.path(), "sub/b.png", 3, 3, [0, 255, 0, 255]);
    write_png(input.path(), "sub/deep/c.png", 4, 4, [0, 0, 255, 255]);
    std::fs::write(input.path().join("notes.txt"), "not an image").unwrap();
    std::fs::write(input.path().join("sub/photo.jpg"), "jpeg-ish").unwrap();

    let observer: Arc<dyn PipelineObserver> = Arc::new(NoopObserver);
    let assets = discover_assets(input.path(), &[], &observer).await.unwrap();
    let paths: Vec<_> = assets.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, ["a.png", "sub/b.png", "sub/deep/c.png"]);
    for a in &assets {
        let on_disk = std::fs::read(input.path().join(&a.path)).unwrap();
        assert_eq!(&*a.contents, on_disk.as_slice());
    }
}

#[tokio::test]
async fn hidden_files_and_directories_are_not_discovered() {
    let input = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [255, 0, 0, 255]);
    write_png(input.path(), ".hidden.png", 2, 2, [0, 255, 0, 255]);
    write_png(input.path(), ".cache/b.png", 2, 2, [0, 0, 255, 255]);

    let observer: Arc<dyn PipelineObserver> = Arc::new(NoopObserver);
    let assets = discover_assets(input.path(), &[], &observer).await.unwrap();
    let paths: Vec<_> = assets.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, ["a.png"]);
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_asset_aborts_the_run_before_packing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [1, 2, 3, 255]);
    std::os::unix::fs::symlink(input.path().join("gone.png"), input.path().join("b.png")).unwrap();

    let engine = Arc::new(ScriptedEngine::default());
    let err = PipelineRun::new(input.path(), output.path())
        .with_engine(engine.clone())
        .with_observer(Arc::new(NoopObserver))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Io { ref path, .. } if path.ends_with("b.png")));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn dangling_links_that_do_not_match_are_ignored() {
    let input = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [1, 2, 3, 255]);
    std::os::unix::fs::symlink(input.path().join("gone"), input.path().join("notes.txt")).unwrap();
    std::os::unix::fs::symlink(input.path().join("nowhere"), input.path().join("linked-dir")).unwrap();

    let observer: Arc<dyn PipelineObserver> = Arc::new(NoopObserver);
    let assets = discover_assets(input.path(), &[], &observer).await.unwrap();
    let paths: Vec<_> = assets.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, ["a.png"]);
}

#[tokio::test]
async fn missing_input_dir_is_fatal_and_skips_the_engine() {
    let output = tempfile::tempdir().unwrap();
    let engine = Arc::new(ScriptedEngine::default());
    let err = PipelineRun::new(output.path().join("nope"), output.path())
        .with_engine(engine.clone())
        .with_observer(Arc::new(NoopObserver))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputDirMissing(_)));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn one_failing_configuration_does_not_affect_the_others() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [1, 2, 3, 255]);

    let observer = Arc::new(RecordingObserver(Mutex::new(Vec::new())));
    let report = PipelineRun::new(input.path(), output.path())
        .with_configurations(named(&["first", "boom", "third", "panic"]))
        .with_engine(Arc::new(ScriptedEngine::default()))
        .with_observer(observer.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.assets, 1);
    assert_eq!(report.configurations.len(), 4);
    let failed: Vec<usize> = report
        .configurations
        .iter()
        .filter(|c| c.is_failed())
        .map(|c| c.index)
        .collect();
    assert_eq!(failed, [1, 3]);
    assert!(output.path().join("first.txt").exists());
    assert!(output.path().join("third.txt").exists());
    assert_eq!(report.files_written(), 2);

    let events = observer.0.lock().unwrap();
    let failures = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::ConfigurationFailed { .. }))
        .count();
    assert_eq!(failures, 2);
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::RunCompleted {
            failed_configurations: 2,
            ..
        })
    ));
}

#[tokio::test]
async fn colliding_names_keep_the_last_write() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [1, 2, 3, 255]);

    PipelineRun::new(input.path(), output.path())
        .with_configurations(named(&["shared-slow", "shared-fast"]))
        .with_engine(Arc::new(ScriptedEngine::default()))
        .with_observer(Arc::new(NoopObserver))
        .run()
        .await
        .unwrap();

    let text = std::fs::read_to_string(output.path().join("shared.txt")).unwrap();
    assert!(text.starts_with("shared-slow"), "{text}");
}

#[tokio::test]
async fn empty_input_still_invokes_the_engine() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let report = PipelineRun::new(input.path(), output.path())
        .with_observer(Arc::new(NoopObserver))
        .run()
        .await
        .unwrap();

    assert_eq!(report.assets, 0);
    let files = read_dir_bytes(output.path());
    assert_eq!(files.keys().collect::<Vec<_>>(), ["pack-result.json"]);
    let meta: serde_json::Value = serde_json::from_slice(&files["pack-result.json"]).unwrap();
    assert_eq!(meta["frames"].as_object().unwrap().len(), 0);
}

#[tokio::test]
async fn single_configuration_equals_one_element_list() {
    let input = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 8, 4, [200, 10, 10, 255]);
    write_png(input.path(), "b/c.png", 5, 9, [10, 200, 10, 255]);
    let cfg = PackingConfiguration::builder()
        .texture_name("atlas")
        .padding(1)
        .build();

    let single = tempfile::tempdir().unwrap();
    let list = tempfile::tempdir().unwrap();
    PipelineRun::new(input.path(), single.path())
        .with_configurations(ConfigurationSet::One(cfg.clone()))
        .with_observer(Arc::new(NoopObserver))
        .run()
        .await
        .unwrap();
    PipelineRun::new(input.path(), list.path())
        .with_configurations(ConfigurationSet::Many(vec![cfg]))
        .with_observer(Arc::new(NoopObserver))
        .run()
        .await
        .unwrap();

    let a = read_dir_bytes(single.path());
    assert_eq!(a.len(), 2);
    assert_eq!(a, read_dir_bytes(list.path()));
}

#[tokio::test]
async fn rerunning_produces_identical_bytes() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    for i in 0..6u32 {
        write_png(
            input.path(),
            &format!("s{i}.png"),
            3 + i * 2,
            10 - i,
            [i as u8 * 40, 100, 200, 255],
        );
    }
    let run = PipelineRun::new(input.path(), output.path())
        .with_configurations(vec![
            PackingConfiguration::builder().texture_name("x").build(),
            PackingConfiguration::builder()
                .texture_name("y")
                .optimal()
                .build(),
        ])
        .with_observer(Arc::new(NoopObserver));

    run.run().await.unwrap();
    let first = read_dir_bytes(output.path());
    run.run().await.unwrap();
    assert_eq!(first, read_dir_bytes(output.path()));
    assert_eq!(first.len(), 4);
}

#[tokio::test]
async fn strict_policy_reports_partial_failure_after_everything_settles() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [1, 2, 3, 255]);

    let err = PipelineRun::new(input.path(), output.path())
        .with_configurations(named(&["ok", "boom"]))
        .with_engine(Arc::new(ScriptedEngine::default()))
        .with_observer(Arc::new(NoopObserver))
        .with_policy(FailurePolicy::Strict)
        .run()
        .await
        .unwrap_err();

    let PipelineError::PartialFailure { report } = err else {
        panic!("expected a partial failure");
    };
    assert_eq!(report.failed_configurations(), 1);
    assert_eq!(report.failed_files(), 0);
    assert!(!report.configurations[0].is_failed());
    assert!(report.configurations[1].is_failed());
    assert_eq!(report.files_written(), 1);
    assert!(output.path().join("ok.txt").exists());
}

#[tokio::test]
async fn missing_output_dir_fails_fast_unless_creation_is_enabled() {
    let input = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [1, 2, 3, 255]);
    let out = scratch.path().join("dist/atlas");

    let engine = Arc::new(ScriptedEngine::default());
    let err = PipelineRun::new(input.path(), &out)
        .with_engine(engine.clone())
        .with_observer(Arc::new(NoopObserver))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::OutputDirMissing(_)));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);

    let report = PipelineRun::new(input.path(), &out)
        .with_engine(engine.clone())
        .with_observer(Arc::new(NoopObserver))
        .with_options(RunOptions {
            create_output_dir: true,
            ..Default::default()
        })
        .run()
        .await
        .unwrap();
    assert!(report.is_success());
    assert!(out.join("default.txt").exists());
}

#[tokio::test]
async fn bounded_concurrency_still_runs_every_configuration() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 2, 2, [1, 2, 3, 255]);

    let engine = Arc::new(ScriptedEngine::default());
    let report = PipelineRun::new(input.path(), output.path())
        .with_configurations(named(&["a", "b", "c", "d", "e"]))
        .with_engine(engine.clone())
        .with_observer(Arc::new(NoopObserver))
        .with_options(RunOptions {
            max_concurrency: Some(2),
            ..Default::default()
        })
        .run()
        .await
        .unwrap();
    assert_eq!(engine.calls.load(Ordering::SeqCst), 5);
    let indices: Vec<usize> = report.configurations.iter().map(|c| c.index).collect();
    assert_eq!(indices, [0, 1, 2, 3, 4]);
    assert_eq!(report.files_written(), 5);
}
