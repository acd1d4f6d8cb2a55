//! Benchmarks for index encode, decode and lookup

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gial_rs::{decode_index, AssetDescriptor, EncoderConfig, IndexEncoder, SourceSizes};

const TYPES: [&str; 6] = ["Texture2D", "Mesh", "Material", "Shader", "AnimationClip", "Sprite"];

fn create_asset_map(count: usize) -> (Vec<AssetDescriptor>, SourceSizes) {
    let blocks = (count / 50).max(1);
    let mut sizes = SourceSizes::new();
    for b in 0..blocks {
        sizes.insert(format!("{:08}", b), 1024 * 1024 + b as u64);
    }

    let assets = (0..count)
        .map(|i| {
            let block = i % blocks;
            AssetDescriptor::new(
                format!("Asset_{:06}", i),
                TYPES[i % TYPES.len()],
                format!("blocks/{:02}/{:08}.blk", block % 100, block),
                format!("assets/bundle_{}.ab", i % 500),
            )
        })
        .collect();

    (assets, sizes)
}

fn encoder() -> IndexEncoder {
    IndexEncoder::new(EncoderConfig::new("hk4e", "5.1", "20240301203033_RZSIny3hwJ5nq959"))
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_encode");

    for count in [1_000, 10_000, 100_000].iter() {
        let (assets, sizes) = create_asset_map(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| encoder().encode(black_box(&assets), black_box(&sizes)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_decode");

    for count in [1_000, 10_000, 100_000].iter() {
        let (assets, sizes) = create_asset_map(*count);
        let bytes = encoder().encode(&assets, &sizes).unwrap().bytes;
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| decode_index(black_box(&bytes)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_search(c: &mut Criterion) {
    let (assets, sizes) = create_asset_map(100_000);
    let index = decode_index(&encoder().encode(&assets, &sizes).unwrap().bytes).unwrap();

    c.bench_function("index_search_substring", |b| {
        b.iter(|| black_box(index.search(black_box("asset_0999"), "mesh")));
    });

    c.bench_function("index_plan_100", |b| {
        let names: Vec<String> = (0..100).map(|i| format!("Asset_{:06}", i * 997)).collect();
        b.iter(|| index.plan(black_box(&names)).unwrap());
    });
}

criterion_group!(benches, benchmark_encode, benchmark_decode, benchmark_search);
criterion_main!(benches);
