use criterion::{criterion_group, criterion_main, Criterion};
use lz_angst::framed::{decompress_frame, CompressionSettings};
use rand::prelude::*;
use std::io::Cursor;

fn criterion_benchmark(c: &mut Criterion) {
    let mut data = vec![0u8; 10_000_000];
    thread_rng().fill(&mut data[2_000_000..6_000_000]); // mixed

    let compressed = CompressionSettings::default()
        .compress(Cursor::new(&data), Vec::new())
        .unwrap();

    c.bench_function("compress 10MB mixed", |b| {
        b.iter(|| {
            CompressionSettings::default()
                .compress(Cursor::new(&data), Vec::new())
                .unwrap()
        })
    });

    c.bench_function("decompress 10MB mixed", |b| {
        b.iter(|| decompress_frame(Cursor::new(&compressed)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
