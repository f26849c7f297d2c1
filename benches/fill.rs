// Run with:  cargo bench --bench fill

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dotstar_strip::buffer::FrameBuffer;
use dotstar_strip::{buffer_size, Color, ColorOrder};
use std::hint::black_box;

const N: usize = 144;
const BUF: usize = buffer_size(N);

fn fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");
    group.throughput(Throughput::Elements(N as u64));

    group.bench_function("frame_buffer", |b| {
        let mut pixels = FrameBuffer::<N, BUF>::new(ColorOrder::Bgr, 1.0).unwrap();

        b.iter(|| {
            black_box(&mut pixels).fill(black_box(Color::new(32, 64, 96)));
        });
    });

    group.finish();
}

criterion_group!(benches, fill);
criterion_main!(benches);
