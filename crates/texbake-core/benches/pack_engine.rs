use std::hint::black_box;
use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use image::{ImageFormat, Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use texbake_core::prelude::*;
use texbake_core::pack_atlas;

fn generate_assets(count: usize, min_size: u32, max_size: u32) -> Vec<AssetRecord> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            let img = RgbaImage::from_pixel(w, h, Rgba([rng.r#gen(), rng.r#gen(), rng.r#gen(), 255]));
            let mut buf = Cursor::new(Vec::new());
            img.write_to(&mut buf, ImageFormat::Png).unwrap();
            AssetRecord::new(format!("tex_{i}.png"), buf.into_inner())
        })
        .collect()
}

fn bench_packers(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_engine");

    for count in [50, 200] {
        let assets = generate_assets(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));

        let variants = [
            ("MaxRectsBin_BSSF", PackingConfiguration::builder().build()),
            (
                "MaxRectsBin_CP",
                PackingConfiguration::builder()
                    .max_rects_bin(MaxRectsBinMethod::ContactPointRule)
                    .build(),
            ),
            (
                "MaxRectsPacker_Smart",
                PackingConfiguration::builder()
                    .max_rects_packer(MaxRectsPackerMethod::Smart)
                    .build(),
            ),
            ("Optimal", PackingConfiguration::builder().optimal().build()),
        ];

        for (label, cfg) in variants {
            group.bench_with_input(BenchmarkId::new(label, count), &assets, |b, assets| {
                b.iter(|| black_box(pack_atlas(assets, &cfg).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_pipeline_run(c: &mut Criterion) {
    let input = tempfile::tempdir().unwrap();
    for asset in generate_assets(100, 8, 48) {
        std::fs::write(input.path().join(&asset.path), &*asset.contents).unwrap();
    }
    let output = tempfile::tempdir().unwrap();
    let run = PipelineRun::new(input.path(), output.path())
        .with_configurations(vec![
            PackingConfiguration::builder().texture_name("full").build(),
            PackingConfiguration::builder()
                .texture_name("half")
                .scale(0.5, ScaleMethod::Bilinear)
                .build(),
            PackingConfiguration::builder()
                .texture_name("jpg")
                .texture_format(TextureFormat::Jpg)
                .build(),
        ])
        .with_observer(std::sync::Arc::new(texbake_core::NoopObserver));
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("pipeline_run_3_configs", |b| {
        b.to_async(&rt).iter(|| async { black_box(run.run().await.unwrap()) });
    });
}

criterion_group!(benches, bench_packers, bench_pipeline_run);
criterion_main!(benches);
