//! Benchmark to measure the coarse search's scaling with clip length
//!
//! Runs `SyncFinder::search` over synthetic clips of increasing length and
//! reports wall-clock time, to make regressions in the rayon fan-out
//! visible without needing a profiler.

use std::time::Instant;

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use syncfinder::{Key, Mode, Params, SyncFinder, WavData};

fn synthetic_clip(n_frames: usize, frame_size: usize, seed: u64) -> WavData {
    let noise = Normal::new(0.0, 0.02).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<f32> = (0..n_frames * frame_size)
        .map(|i| (i as f32 * 0.017).sin() * 0.1 + noise.sample(&mut rng) as f32)
        .collect();
    WavData::from_samples(samples, 1, 44_100)
}

fn main() {
    println!("\n=== Coarse Search Benchmark ===\n");

    let analyzer = syncfinder::fft::RustFftAnalyzer;
    let params = Params::default().with_frame_size(256).with_band_range(8, 24);
    let finder = SyncFinder::new(params, &analyzer);
    let keys: Vec<Key> = (0..4).map(Key::new).collect();

    for &n_frames in &[200usize, 800, 2000] {
        let wav = synthetic_clip(n_frames, 256, n_frames as u64);
        let start = Instant::now();
        let results = finder.search(&keys, &wav, Mode::Block);
        let elapsed = start.elapsed();

        let total_scores: usize = results.iter().map(|r| r.sync_scores.len()).sum();
        println!(
            "{n_frames:>5} frames, {} keys: {elapsed:?} ({total_scores} candidate scores)",
            keys.len()
        );
    }
}
