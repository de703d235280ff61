//! Spectral analysis
//!
//! The coarse and fine search stages both need the magnitude spectrum of a
//! single analysis frame in dB. `FftAnalyzer` is the seam between that need
//! and a concrete FFT implementation, so tests can swap in a stub without
//! linking `rustfft`. [`RustFftAnalyzer`] is the production implementation,
//! caching forward plans keyed by frame size so repeated analyses at the
//! same frame size skip planner setup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::params::FFT_DB_FLOOR;

static FFT_FORWARD_CACHE: Lazy<Mutex<HashMap<usize, Arc<dyn Fft<f32>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn forward_plan(n: usize) -> Arc<dyn Fft<f32>> {
    let mut cache = FFT_FORWARD_CACHE.lock().unwrap();
    if let Some(plan) = cache.get(&n) {
        return Arc::clone(plan);
    }
    let plan = FftPlanner::new().plan_fft_forward(n);
    cache.insert(n, Arc::clone(&plan));
    plan
}

/// Converts one analysis frame into per-bin magnitude in dB.
pub trait FftAnalyzer: Send + Sync {
    /// Window and transform `frame`, returning `db[bin]` for
    /// `bin in 0..frame.len() / 2`.
    fn analyze(&self, frame: &[f32]) -> Vec<f64>;
}

/// `FftAnalyzer` backed by `rustfft`, with a Hann window and a cached plan
/// per frame size.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustFftAnalyzer;

impl FftAnalyzer for RustFftAnalyzer {
    fn analyze(&self, frame: &[f32]) -> Vec<f64> {
        let n = frame.len();
        let mut buffer: Vec<Complex<f32>> = frame
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let w = 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos();
                Complex::new(s * w, 0.0)
            })
            .collect();

        forward_plan(n).process(&mut buffer);

        buffer[..n / 2].iter().map(db_from_complex).collect()
    }
}

/// `20 * log10(|c|)`, floored at [`FFT_DB_FLOOR`] so silence doesn't produce
/// `-inf`.
pub fn db_from_complex(c: &Complex<f32>) -> f64 {
    let magnitude = (c.re as f64).hypot(c.im as f64);
    (20.0 * magnitude.log10()).max(FFT_DB_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_floored_not_infinite() {
        let analyzer = RustFftAnalyzer;
        let db = analyzer.analyze(&[0.0; 64]);
        assert!(db.iter().all(|&v| v.is_finite()));
        assert!(db.iter().all(|&v| v >= FFT_DB_FLOOR));
    }

    #[test]
    fn pure_tone_peaks_near_its_bin() {
        let n = 256;
        let bin = 10;
        let frame: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / n as f32).sin())
            .collect();
        let db = RustFftAnalyzer.analyze(&frame);
        let (peak_bin, _) = db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!((peak_bin as i64 - bin).abs() <= 1, "peak at {peak_bin}");
    }

    #[test]
    fn db_from_complex_floors_zero_magnitude() {
        assert_eq!(db_from_complex(&Complex::new(0.0, 0.0)), FFT_DB_FLOOR);
    }
}
