// Run with:  cargo bench --bench set_pixel

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dotstar_strip::buffer::FrameBuffer;
use dotstar_strip::{buffer_size, Color, ColorOrder};
use std::hint::black_box;

const N: usize = 144;
const BUF: usize = buffer_size(N);

fn set_pixel(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_pixel");
    group.throughput(Throughput::Elements(N as u64));

    group.bench_function("frame_buffer", |b| {
        let mut pixels = FrameBuffer::<N, BUF>::new(ColorOrder::Bgr, 0.5).unwrap();

        b.iter(|| {
            for index in 0..N {
                black_box(&mut pixels)
                    .set(black_box(index), black_box(Color::new(255, 128, 64)))
                    .unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, set_pixel);
criterion_main!(benches);
