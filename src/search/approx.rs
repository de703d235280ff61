//! Coarse search pass
//!
//! Scores every plausible sample offset, for every key, at a fraction of
//! `frame_size` granularity. This is the expensive stage — it is the one
//! that sweeps a whole clip — so it leans entirely on
//! [`crate::threadpool::ThreadPool`] and [`crate::grid::sync_fft_parallel`]
//! to spread work across cores. Precision is recovered later, on far fewer
//! candidates, in [`super::refine::search_refine`].

use std::sync::Mutex;

use tracing::debug;

use crate::fft::FftAnalyzer;
use crate::grid::{split_vector, sync_fft_parallel};
use crate::params::{Mode, Params, EFFECTIVE_STEP_FLOOR, NOISE_WINDOW_HALF, SELF_EXCLUSION_RADIUS};
use crate::schedule::SyncSchedule;
use crate::score::{SearchKeyResult, SearchScore};
use crate::threadpool::ThreadPool;
use crate::wav::WavData;

const START_FRAME_CHUNK: usize = 256;

fn frame_count(wav_data: &WavData, params: &Params) -> usize {
    wav_data.n_samples() / params.frame_size
}

/// Runs the coarse search, filling in `raw_quality` (and a placeholder
/// `local_mean = 0.0`) for every key in `key_results`.
pub fn search_approx(
    key_results: &mut [SearchKeyResult],
    sync_bits: &[SyncSchedule],
    wav_data: &WavData,
    analyzer: &(dyn FftAnalyzer + Sync),
    params: &Params,
    mode: Mode,
    silence_range: (usize, usize),
) {
    let n_bands = params.n_bands();
    let mut total_frame_count = params.mark_sync_frame_count() + params.mark_data_frame_count;
    if mode == Mode::Clip {
        total_frame_count *= 2;
    }

    let sync_search_step_eff = (params.sync_search_step / 2).max(EFFECTIVE_STEP_FLOOR);
    let frames_needed = frame_count(wav_data, params);

    let result_scores: Vec<Mutex<Vec<SearchScore>>> =
        key_results.iter().map(|_| Mutex::new(Vec::new())).collect();

    let mut sync_shift = 0;
    while sync_shift < params.frame_size {
        let (fft_db, have_frames) = sync_fft_parallel(
            wav_data,
            analyzer,
            params,
            sync_shift,
            frames_needed,
            silence_range,
        );

        let start_frames: Vec<usize> = (0..frames_needed)
            .filter(|&s| (s + total_frame_count) * n_bands < fft_db.len())
            .collect();

        let fft_db_ref = &fft_db;
        let have_frames_ref = &have_frames;
        let thread_pool = ThreadPool::new();
        for (k, sync_schedule) in sync_bits.iter().enumerate() {
            for chunk in split_vector(&start_frames, START_FRAME_CHUNK) {
                let result_scores = &result_scores[k];
                thread_pool.submit(move || {
                    let mut local = Vec::with_capacity(chunk.len());
                    for start_frame in chunk {
                        let quality = crate::decode::sync_decode(
                            sync_schedule,
                            start_frame,
                            fft_db_ref,
                            have_frames_ref,
                            params,
                        );
                        let index = start_frame * params.frame_size + sync_shift;
                        local.push(SearchScore {
                            index,
                            raw_quality: quality,
                            local_mean: 0.0,
                        });
                    }
                    result_scores.lock().unwrap().extend(local);
                });
            }
        }
        thread_pool.wait_all();
        sync_shift += sync_search_step_eff;
    }

    for (key_result, scores) in key_results.iter_mut().zip(result_scores) {
        key_result.scores = scores.into_inner().unwrap();
        key_result.scores.sort_by_key(|s| s.index);
        compute_local_means(&mut key_result.scores, params);
    }

    debug!(
        n_keys = key_results.len(),
        "coarse search complete"
    );
}

fn compute_local_means(scores: &mut [SearchScore], params: &Params) {
    let local_mean_distance = crate::params::LOCAL_MEAN_DISTANCE;
    let n = scores.len() as i64;

    let local_means: Vec<f64> = (0..n)
        .map(|i| {
            let mut window_size = local_mean_distance;
            if scores.len() > 100 {
                let lo = (i - NOISE_WINDOW_HALF).max(0);
                let hi = (i + NOISE_WINDOW_HALF).min(n);
                let mut noise_level = 0.0;
                let mut noise_samples = 0i64;
                for j in lo..hi {
                    if j != i {
                        noise_level += scores[j as usize].raw_quality.abs();
                        noise_samples += 1;
                    }
                }
                if noise_samples > 0 {
                    noise_level /= noise_samples as f64;
                    window_size = local_mean_distance.max(
                        (2 * local_mean_distance)
                            .min((local_mean_distance as f64 * (1.0 + noise_level)) as i64),
                    );
                }
            }

            let mut avg = 0.0;
            let mut count = 0i64;
            for j in -window_size..=window_size {
                if j.abs() >= SELF_EXCLUSION_RADIUS {
                    let idx = i + j;
                    if idx >= 0 && idx < n {
                        avg += scores[idx as usize].raw_quality;
                        count += 1;
                    }
                }
            }
            if count > 0 {
                avg /= count as f64;
            }
            avg
        })
        .collect();

    for (score, mean) in scores.iter_mut().zip(local_means) {
        score.local_mean = mean;
    }
}
