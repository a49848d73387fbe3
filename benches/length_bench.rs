//! Benchmarks for code point counting and output length estimation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use turbo_unicode::kernel::supported_kernels;

const SIZE: usize = 1024 * 1024;

fn mixed_text() -> String {
    let pattern = "Hello, world! Café résumé. 日本語 中文 한국어. Emoji: 🎉🚀💻.\n";
    pattern.repeat(SIZE / pattern.len() + 1)
}

fn bench_utf8_lengths(c: &mut Criterion) {
    let text = mixed_text();
    let input = text.as_bytes();
    let mut group = c.benchmark_group("utf8_lengths");
    group.throughput(Throughput::Bytes(input.len() as u64));
    for kernel in supported_kernels() {
        let Some(ops) = kernel.ops() else { continue };
        group.bench_function(BenchmarkId::new("count_utf8", kernel.name()), |b| {
            b.iter(|| ops.count_utf8(black_box(input)))
        });
        group.bench_function(BenchmarkId::new("utf16_length", kernel.name()), |b| {
            b.iter(|| ops.utf16_length_from_utf8(black_box(input)))
        });
    }
    group.finish();
}

fn bench_utf16_lengths(c: &mut Criterion) {
    let units: Vec<u16> = mixed_text().encode_utf16().map(u16::to_le).collect();
    let mut group = c.benchmark_group("utf16_lengths");
    group.throughput(Throughput::Bytes(2 * units.len() as u64));
    for kernel in supported_kernels() {
        let Some(ops) = kernel.ops() else { continue };
        group.bench_function(BenchmarkId::new("count_utf16le", kernel.name()), |b| {
            b.iter(|| ops.count_utf16le(black_box(&units)))
        });
        group.bench_function(BenchmarkId::new("utf8_length", kernel.name()), |b| {
            b.iter(|| ops.utf8_length_from_utf16le(black_box(&units)))
        });
    }
    group.finish();
}

fn bench_utf32_lengths(c: &mut Criterion) {
    let units: Vec<u32> = mixed_text().chars().map(u32::from).collect();
    let mut group = c.benchmark_group("utf32_lengths");
    group.throughput(Throughput::Bytes(4 * units.len() as u64));
    for kernel in supported_kernels() {
        let Some(ops) = kernel.ops() else { continue };
        group.bench_function(BenchmarkId::new("utf8_length", kernel.name()), |b| {
            b.iter(|| ops.utf8_length_from_utf32(black_box(&units)))
        });
        group.bench_function(BenchmarkId::new("utf16_length", kernel.name()), |b| {
            b.iter(|| ops.utf16_length_from_utf32(black_box(&units)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_utf8_lengths,
    bench_utf16_lengths,
    bench_utf32_lengths
);
criterion_main!(benches);
