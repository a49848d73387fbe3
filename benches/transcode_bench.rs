//! Benchmarks for conversions between UTF-8, UTF-16LE and UTF-32 on every
//! supported kernel.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use turbo_unicode::kernel::supported_kernels;

const SIZE: usize = 256 * 1024;

const CONTENTS: [(&str, &str); 4] = [
    ("ascii", "The quick brown fox jumps over the lazy dog.\n"),
    ("latin", "Café résumé naïve über façade déjà vu. "),
    ("cjk", "日本語中文韓國語漢字平仮名片仮名한글조선어"),
    ("emoji", "🎉🚀💻🔥🌍😀🎯💡🌟🎨 mixed with text "),
];

fn text(pattern: &str) -> String {
    pattern.repeat(SIZE / pattern.len() + 1)
}

fn bench_from_utf8(c: &mut Criterion) {
    for (content, pattern) in CONTENTS {
        let text = text(pattern);
        let input = text.as_bytes();
        let mut group = c.benchmark_group(format!("utf8_to_utf16le/{}", content));
        group.throughput(Throughput::Bytes(input.len() as u64));
        for kernel in supported_kernels() {
            let Some(ops) = kernel.ops() else { continue };
            let mut out = vec![0u16; ops.utf16_length_from_utf8(input)];
            group.bench_function(BenchmarkId::new("checked", kernel.name()), |b| {
                b.iter(|| ops.convert_utf8_to_utf16le(black_box(input), &mut out))
            });
            group.bench_function(BenchmarkId::new("valid", kernel.name()), |b| {
                b.iter(|| ops.convert_valid_utf8_to_utf16le(black_box(input), &mut out))
            });
        }
        group.finish();

        let mut group = c.benchmark_group(format!("utf8_to_utf32/{}", content));
        group.throughput(Throughput::Bytes(input.len() as u64));
        for kernel in supported_kernels() {
            let Some(ops) = kernel.ops() else { continue };
            let mut out = vec![0u32; ops.utf32_length_from_utf8(input)];
            group.bench_function(kernel.name(), |b| {
                b.iter(|| ops.convert_utf8_to_utf32(black_box(input), &mut out))
            });
        }
        group.finish();
    }
}

fn bench_from_utf16(c: &mut Criterion) {
    for (content, pattern) in CONTENTS {
        let units: Vec<u16> = text(pattern).encode_utf16().map(u16::to_le).collect();
        let mut group = c.benchmark_group(format!("utf16le_to_utf8/{}", content));
        group.throughput(Throughput::Bytes(2 * units.len() as u64));
        for kernel in supported_kernels() {
            let Some(ops) = kernel.ops() else { continue };
            let mut out = vec![0u8; ops.utf8_length_from_utf16le(&units)];
            group.bench_function(kernel.name(), |b| {
                b.iter(|| ops.convert_utf16le_to_utf8(black_box(&units), &mut out))
            });
        }
        group.finish();

        let mut group = c.benchmark_group(format!("utf16le_to_utf32/{}", content));
        group.throughput(Throughput::Bytes(2 * units.len() as u64));
        for kernel in supported_kernels() {
            let Some(ops) = kernel.ops() else { continue };
            let mut out = vec![0u32; ops.utf32_length_from_utf16le(&units)];
            group.bench_function(kernel.name(), |b| {
                b.iter(|| ops.convert_utf16le_to_utf32(black_box(&units), &mut out))
            });
        }
        group.finish();
    }
}

fn bench_from_utf32(c: &mut Criterion) {
    for (content, pattern) in CONTENTS {
        let units: Vec<u32> = text(pattern).chars().map(u32::from).collect();
        let mut group = c.benchmark_group(format!("utf32_to_utf8/{}", content));
        group.throughput(Throughput::Bytes(4 * units.len() as u64));
        for kernel in supported_kernels() {
            let Some(ops) = kernel.ops() else { continue };
            let mut out = vec![0u8; ops.utf8_length_from_utf32(&units)];
            group.bench_function(kernel.name(), |b| {
                b.iter(|| ops.convert_utf32_to_utf8(black_box(&units), &mut out))
            });
        }
        group.finish();

        let mut group = c.benchmark_group(format!("utf32_to_utf16le/{}", content));
        group.throughput(Throughput::Bytes(4 * units.len() as u64));
        for kernel in supported_kernels() {
            let Some(ops) = kernel.ops() else { continue };
            let mut out = vec![0u16; ops.utf16_length_from_utf32(&units)];
            group.bench_function(kernel.name(), |b| {
                b.iter(|| ops.convert_utf32_to_utf16le(black_box(&units), &mut out))
            });
        }
        group.finish();
    }
}

fn bench_change_endianness(c: &mut Criterion) {
    let units: Vec<u16> = text(CONTENTS[2].1).encode_utf16().collect();
    let mut out = vec![0u16; units.len()];
    let mut group = c.benchmark_group("change_endianness_utf16");
    group.throughput(Throughput::Bytes(2 * units.len() as u64));
    for kernel in supported_kernels() {
        let Some(ops) = kernel.ops() else { continue };
        group.bench_function(kernel.name(), |b| {
            b.iter(|| ops.change_endianness_utf16(black_box(&units), &mut out))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_from_utf8,
    bench_from_utf16,
    bench_from_utf32,
    bench_change_endianness
);
criterion_main!(benches);
