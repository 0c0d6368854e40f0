//! Pipeline Benchmarks
//!
//! Performance benchmarks for the render stages.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use aymix::dsp::{shaping_filter, PolyphaseResampler};
use aymix::engine::{render_pcm, ChannelDumps, StereoSignal};
use aymix::flac::FlacEncoder;

/// One second of a square wave at the dump rate
fn square_dump(half_period: usize) -> Vec<u16> {
    (0..218_750)
        .map(|i| if (i / half_period) % 2 == 0 { 40_000 } else { 0 })
        .collect()
}

fn benchmark_resample_one_second(c: &mut Criterion) {
    let resampler = PolyphaseResampler::ay_to_output();
    let dump = square_dump(249);

    c.bench_function("resample_1s_channel", |b| {
        b.iter(|| resampler.process_u16(black_box(&dump)))
    });
}

fn benchmark_shaping_filter(c: &mut Criterion) {
    let signal = StereoSignal {
        left: (0..480_000).map(|i| (i as f64 * 0.05).sin()).collect(),
        right: (0..480_000).map(|i| (i as f64 * 0.07).sin()).collect(),
    };

    c.bench_function("shaping_filter_10s_stereo", |b| {
        b.iter(|| {
            let mut signal = signal.clone();
            shaping_filter().apply_stereo(black_box(&mut signal));
        })
    });
}

fn benchmark_flac_encode(c: &mut Criterion) {
    let left: Vec<i16> = (0..480_000)
        .map(|i| ((i as f64 * 0.03).sin() * 20_000.0) as i16)
        .collect();
    let right: Vec<i16> = left.iter().rev().copied().collect();
    let encoder = FlacEncoder::new(48_000);

    c.bench_function("flac_encode_10s_stereo", |b| {
        b.iter(|| encoder.encode_stereo(black_box(&left), black_box(&right)))
    });
}

fn benchmark_full_render(c: &mut Criterion) {
    let dumps = ChannelDumps::new(square_dump(249), square_dump(331), square_dump(497));

    c.bench_function("render_pcm_1s", |b| {
        b.iter(|| render_pcm(black_box(&dumps)))
    });
}

criterion_group!(
    benches,
    benchmark_resample_one_second,
    benchmark_shaping_filter,
    benchmark_flac_encode,
    benchmark_full_render
);
criterion_main!(benches);
