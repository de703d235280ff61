//! Building the per-frame dB grid search scoring reads from
//!
//! `sync_fft` turns a run of consecutive frames starting at a sample index
//! into a flat `[frame * n_bands + band]` dB grid, averaging channels. The
//! parallel variant fans that work out across the whole clip using a
//! [`crate::threadpool::ThreadPool`], computing one time-shifted FFT vector
//! per coarse search step.

use crate::fft::FftAnalyzer;
use crate::params::Params;
use crate::threadpool::ThreadPool;
use crate::wav::WavData;
use std::sync::Mutex;

const PARALLEL_CHUNK: usize = 32;

/// Computes the dB grid for `frame_count` consecutive frames starting at
/// sample `index`, restricted to `[min_band, max_band]`.
///
/// `want_frames`, if non-empty, skips every frame whose slot is `false` —
/// used by the refine stage, which only needs frames that actually carry
/// sync data. Returns `(fft_out_db, have_frames)`; both are empty if
/// `index` would read past the end of `wav_data`.
pub fn sync_fft(
    wav_data: &WavData,
    analyzer: &dyn FftAnalyzer,
    params: &Params,
    index: usize,
    frame_count: usize,
    want_frames: &[bool],
    silence_range: (usize, usize),
) -> (Vec<f64>, Vec<bool>) {
    let n_channels = wav_data.n_channels();
    let n_bands = params.n_bands();

    if wav_data.n_values() < (index + frame_count * params.frame_size) * n_channels {
        return (Vec::new(), Vec::new());
    }

    let samples = wav_data.samples();
    let (silence_first, silence_last) = silence_range;

    let mut fft_out_db = vec![0.0; n_bands * frame_count];
    let mut have_frames = vec![false; frame_count];

    for f in 0..frame_count {
        if !want_frames.is_empty() && !want_frames[f] {
            continue;
        }

        let f_first = (index + f * params.frame_size) * n_channels;
        let f_last = (index + (f + 1) * params.frame_size) * n_channels;

        if f_last > samples.len() {
            continue;
        }
        if f_first < silence_first || f_last > silence_last {
            continue;
        }

        have_frames[f] = true;

        for ch in 0..n_channels {
            let channel_frame: Vec<f32> = (0..params.frame_size)
                .map(|i| samples[f_first + i * n_channels + ch])
                .collect();
            let db = analyzer.analyze(&channel_frame);
            for i in 0..n_bands {
                fft_out_db[f * n_bands + i] += db[i + params.min_band];
            }
        }
        if n_channels > 0 {
            for i in 0..n_bands {
                fft_out_db[f * n_bands + i] /= n_channels as f64;
            }
        }
    }

    (fft_out_db, have_frames)
}

/// Splits `items` into chunks of at most `n`, for handing each batch to a
/// separate worker job.
pub fn split_vector<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    items.chunks(n.max(1)).map(|c| c.to_vec()).collect()
}

/// Computes the dB grid for the whole clip at once, fanning the work out
/// across a fresh [`ThreadPool`] in chunks of frames.
///
/// The pool is local to this call rather than shared with the caller: its
/// jobs only ever borrow this function's own locals plus `wav_data` /
/// `analyzer` / `params`, so there is no benefit to threading a pool
/// instance through from the coarse-search loop, and keeping it local keeps
/// the borrow checker happy about exactly how long those jobs need to live.
pub fn sync_fft_parallel(
    wav_data: &WavData,
    analyzer: &(dyn FftAnalyzer + Sync),
    params: &Params,
    sync_shift: usize,
    frames_needed: usize,
    silence_range: (usize, usize),
) -> (Vec<f64>, Vec<bool>) {
    let n_bands = params.n_bands();
    let fft_out_db = Mutex::new(vec![0.0f64; n_bands * frames_needed]);
    let have_frames = Mutex::new(vec![false; frames_needed]);
    let thread_pool = ThreadPool::new();

    for f_start in (0..frames_needed).step_by(PARALLEL_CHUNK) {
        let fft_out_db = &fft_out_db;
        let have_frames = &have_frames;
        thread_pool.submit(move || {
            let chunk_len = PARALLEL_CHUNK.min(frames_needed - f_start);
            let (thread_db, thread_have) = sync_fft(
                wav_data,
                analyzer,
                params,
                sync_shift + f_start * params.frame_size,
                chunk_len,
                &[],
                silence_range,
            );
            if thread_db.is_empty() {
                return;
            }
            let mut fft_out_db = fft_out_db.lock().unwrap();
            let mut have_frames = have_frames.lock().unwrap();
            for fi in 0..thread_have.len() {
                let f = f_start + fi;
                if f < frames_needed && thread_have[fi] {
                    have_frames[f] = true;
                    for i in 0..n_bands {
                        fft_out_db[f * n_bands + i] = thread_db[fi * n_bands + i];
                    }
                }
            }
        });
    }
    thread_pool.wait_all();

    (fft_out_db.into_inner().unwrap(), have_frames.into_inner().unwrap())
}
