//! Benchmarks for Lumen pipelines.
//!
//! Run with: cargo bench -p lumen-core

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat};
use lumen_core::{Config, Lumen, Pipeline};
use std::io::Cursor;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn benchmark_flatten(c: &mut Criterion) {
    let lumen = Lumen::new(Config::default());
    let chunk = Bytes::from(vec![0xA5u8; 16 * 1024]);

    c.bench_function("flatten_64_chunks", |b| {
        b.iter(|| {
            let pipeline = lumen.stream();
            for _ in 0..64 {
                pipeline.accept(chunk.clone()).unwrap();
            }
            black_box(pipeline.complete().unwrap())
        })
    });
}

fn benchmark_clone_fan_out(c: &mut Criterion) {
    let lumen = Lumen::new(Config::default());

    c.bench_function("clone_fan_out_16", |b| {
        b.iter(|| {
            let pipeline = lumen.stream();
            let clones: Vec<Pipeline> = (0..16).map(|_| pipeline.clone()).collect();
            pipeline.accept(Bytes::from_static(b"payload")).unwrap();
            pipeline.complete().unwrap();
            black_box(clones.iter().all(Pipeline::is_finalized))
        })
    });
}

fn benchmark_metadata(c: &mut Criterion) {
    let lumen = Lumen::new(Config::default());
    let data = Bytes::from(png(1920, 1080));
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("metadata_png_buffer", |b| {
        b.to_async(&rt).iter(|| async {
            let pipeline = lumen.open(black_box(data.clone())).unwrap();
            pipeline.metadata().await.unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_flatten,
    benchmark_clone_fan_out,
    benchmark_metadata,
);
criterion_main!(benches);
