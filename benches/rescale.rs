// Run with:  cargo bench --bench rescale
//
// Global brightness changes re-encode every LED frame, which makes them the
// most expensive mutation on a long strip.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dotstar_strip::buffer::FrameBuffer;
use dotstar_strip::{buffer_size, Color, ColorOrder};
use std::hint::black_box;

const N: usize = 144;
const BUF: usize = buffer_size(N);

fn rescale(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescale");
    group.throughput(Throughput::Elements(N as u64));

    group.bench_function("frame_buffer", |b| {
        let mut pixels = FrameBuffer::<N, BUF>::new(ColorOrder::Bgr, 1.0).unwrap();
        pixels.fill(Color::new(200, 100, 50));

        let mut scale = 0.0_f32;
        b.iter(|| {
            scale = if scale > 0.5 { 0.25 } else { 0.75 };
            black_box(&mut pixels).set_brightness(black_box(scale));
        });
    });

    group.finish();
}

criterion_group!(benches, rescale);
criterion_main!(benches);
