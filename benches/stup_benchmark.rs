//! Criterion benchmarks for STUP encode and decode throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stup::{decode, encode, Image, PixelFormat};

/// Generate a gradient test image of the specified size
fn generate_gradient_image(width: usize, height: usize) -> Image {
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            data[x + y * width] = ((x + y) % 256) as u8;
        }
    }
    Image::from_raw(width, height, PixelFormat::Gray, data)
}

/// Generate a busy but deterministic test image
fn generate_pattern_image(width: usize, height: usize) -> Image {
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let val = ((x * 7 + y * 13) ^ (x * y)) % 256;
            data[x + y * width] = val as u8;
        }
    }
    Image::from_raw(width, height, PixelFormat::Gray, data)
}

fn encode_to_vec(img: &Image) -> Vec<u8> {
    let mut out = Vec::new();
    encode(img, &mut out).unwrap();
    out
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for &size in &[256usize, 512, 1024] {
        let gradient = generate_gradient_image(size, size);
        let pattern = generate_pattern_image(size, size);
        group.throughput(Throughput::Bytes((size * size) as u64));

        group.bench_with_input(
            BenchmarkId::new("gradient", size),
            &gradient,
            |b, img| b.iter(|| encode_to_vec(black_box(img))),
        );
        group.bench_with_input(BenchmarkId::new("pattern", size), &pattern, |b, img| {
            b.iter(|| encode_to_vec(black_box(img)))
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &size in &[256usize, 512, 1024] {
        let stream = encode_to_vec(&generate_pattern_image(size, size));
        group.throughput(Throughput::Bytes((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("pattern", size), &stream, |b, stream| {
            b.iter(|| decode(&mut black_box(stream).as_slice()).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
