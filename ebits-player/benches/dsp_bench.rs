//! DSP primitive throughput
//!
//! Measures the per-PLAY cost of seek, speed change and volume scaling on one
//! reference-sized chunk (5 MiB of 16-bit PCM), plus the WAV encode that
//! follows them.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ebits_player::audio::{dsp, wav, AudioFormat};

const CHUNK_BYTES: usize = 5 * 1024 * 1024;

fn test_pcm() -> Vec<u8> {
    (0..CHUNK_BYTES / 2)
        .flat_map(|i| (((i % 2000) as i16) - 1000).to_le_bytes())
        .collect()
}

fn bench_volume(c: &mut Criterion) {
    let pcm = test_pcm();
    let mut group = c.benchmark_group("set_volume");
    group.throughput(Throughput::Bytes(pcm.len() as u64));

    for gain in [0.5, 1.1, 2.0] {
        group.bench_with_input(BenchmarkId::from_parameter(gain), &gain, |b, &gain| {
            b.iter(|| dsp::set_volume(black_box(&pcm), 16, gain).unwrap());
        });
    }
    group.finish();
}

fn bench_speed(c: &mut Criterion) {
    let pcm = test_pcm();
    let mut group = c.benchmark_group("change_speed");
    group.throughput(Throughput::Bytes(pcm.len() as u64));

    for factor in [0.5, 0.9, 1.5, 2.0] {
        group.bench_with_input(BenchmarkId::from_parameter(factor), &factor, |b, &factor| {
            b.iter(|| dsp::change_speed(black_box(&pcm), 16, factor).unwrap());
        });
    }
    group.finish();
}

fn bench_play_path(c: &mut Criterion) {
    let pcm = test_pcm();
    let format = AudioFormat::new(2, 44100, 16);

    c.bench_function("play_seek_speed_volume_encode", |b| {
        b.iter(|| {
            let seeked = dsp::seek(black_box(&pcm), 16, 2, 44100, 5.0).unwrap();
            let faster = dsp::change_speed(&seeked, 16, 1.2).unwrap();
            let louder = dsp::set_volume(&faster, 16, 1.3).unwrap();
            wav::encode(
                &louder,
                AudioFormat {
                    sample_rate: 52920,
                    ..format
                },
            )
            .unwrap()
        });
    });
}

criterion_group!(benches, bench_volume, bench_speed, bench_play_path);
criterion_main!(benches);
