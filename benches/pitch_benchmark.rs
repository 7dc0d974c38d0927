use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voice_pitch::{
    config::DetectorConfig,
    detector::{
        autocorrelation::AutocorrelationEstimator, yin::YinEstimator, PitchEstimator,
    },
    utils::window::prepare_samples,
    NoteMapper, PitchTracker, SampleWindow,
};

const SAMPLE_RATE: u32 = 44100;
const SIZE: usize = 2048;

fn voice_window(freq: f64) -> Vec<u8> {
    // Signal coming from some source (microphone, generated, etc...)
    let dt = 1.0 / SAMPLE_RATE as f64;
    (0..SIZE)
        .map(|x| (128.0 + 100.0 * (2.0 * PI * x as f64 * dt * freq).sin()).round() as u8)
        .collect()
}

pub fn estimator_benchmark(c: &mut Criterion) {
    let config = DetectorConfig::default();
    let signal: Vec<f64> = prepare_samples(&voice_window(300.0));

    let mut yin = YinEstimator::<f64>::new(SIZE);
    let mut autocorrelation = AutocorrelationEstimator::<f64>::new(SIZE);

    c.bench_function("YIN estimate", |b| {
        b.iter(|| yin.estimate(black_box(&signal), SAMPLE_RATE, &config))
    });

    c.bench_function("Autocorrelation estimate", |b| {
        b.iter(|| autocorrelation.estimate(black_box(&signal), SAMPLE_RATE, &config))
    });
}

pub fn tracker_benchmark(c: &mut Criterion) {
    let samples = voice_window(300.0);
    let window = SampleWindow::new(&samples, SAMPLE_RATE, 0.5);
    let mut tracker = PitchTracker::<f64>::new(SIZE);
    let mapper = NoteMapper::new();

    c.bench_function("PitchTracker process", |b| {
        b.iter(|| tracker.process(black_box(&window)))
    });

    c.bench_function("NoteMapper map_frequency", |b| {
        b.iter(|| mapper.map_frequency(black_box(311.13)))
    });
}

criterion_group!(benches, tracker_benchmark, estimator_benchmark);
criterion_main!(benches);
