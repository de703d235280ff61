//! Fine-resolution refinement
//!
//! Coarse search only ever lands within `sync_search_step` samples of the
//! true block boundary. `search_refine` re-scores each surviving candidate
//! at a much finer step, within a window around its coarse index, keeping
//! whichever fine offset maximizes distance from the (unchanged) local
//! mean estimated during the coarse pass.

use crate::fft::FftAnalyzer;
use crate::grid::sync_fft;
use crate::params::{Mode, Params, FINE_STEP_FLOOR};
use crate::prng::BitPosGen;
use crate::schedule::SyncSchedule;
use crate::score::{SearchKeyResult, SearchScore};
use crate::threadpool::ThreadPool;
use crate::wav::WavData;

/// Refines every score in `key_result.scores` in place, replacing each with
/// the best-matching nearby sample offset.
pub fn search_refine(
    wav_data: &WavData,
    analyzer: &(dyn FftAnalyzer + Sync),
    params: &Params,
    mode: Mode,
    key_result: &mut SearchKeyResult,
    sync_bits: &SyncSchedule,
    silence_range: (usize, usize),
) {
    let mut total_frame_count = params.mark_sync_frame_count() + params.mark_data_frame_count;
    let first_block_end = total_frame_count;
    if mode == Mode::Clip {
        total_frame_count *= 2;
    }

    let bit_pos_gen = BitPosGen::new(key_result.key, total_frame_count);
    let mut want_frames = vec![false; total_frame_count];
    for f in 0..params.mark_sync_frame_count() {
        want_frames[bit_pos_gen.sync_frame(f)] = true;
        if mode == Mode::Clip {
            want_frames[first_block_end + bit_pos_gen.sync_frame(f)] = true;
        }
    }

    let fine_step = (params.sync_search_fine / 2).max(FINE_STEP_FLOOR);
    let thread_pool = ThreadPool::new();
    let results: std::sync::Mutex<Vec<SearchScore>> = std::sync::Mutex::new(Vec::new());
    let want_frames_ref = &want_frames;

    for &score in &key_result.scores {
        let results = &results;
        thread_pool.submit(move || {
            let mut best_quality = score.raw_quality;
            let mut best_index = score.index;

            let start = score.index.saturating_sub(params.sync_search_step);
            let end = score.index + params.sync_search_step;

            let mut fine_index = start;
            while fine_index <= end {
                let (fft_db, have_frames) = sync_fft(
                    wav_data,
                    analyzer,
                    params,
                    fine_index,
                    total_frame_count,
                    want_frames_ref,
                    silence_range,
                );
                if !fft_db.is_empty() {
                    let q = crate::decode::sync_decode(sync_bits, 0, &fft_db, &have_frames, params);
                    if (q - score.local_mean).abs() > (best_quality - score.local_mean).abs() {
                        best_quality = q;
                        best_index = fine_index;
                    }
                }
                fine_index += fine_step;
            }

            results.lock().unwrap().push(SearchScore {
                index: best_index,
                raw_quality: best_quality,
                local_mean: score.local_mean,
            });
        });
    }
    thread_pool.wait_all();

    let mut refined = results.into_inner().unwrap();
    refined.sort_by_key(|s| s.index);
    key_result.scores = refined;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    #[test]
    fn refine_keeps_original_when_nothing_better_found() {
        let params = Params::default().with_frame_size(64).with_band_range(4, 8);
        let wav = WavData::from_samples(vec![0.0; 64 * 40], 1, 8000);
        let analyzer = crate::fft::RustFftAnalyzer;
        let schedule = crate::schedule::get_sync_bits(Key::new(1), &params, Mode::Block);
        let mut key_result = SearchKeyResult {
            key: Key::new(1),
            scores: vec![SearchScore {
                index: 5 * 64,
                raw_quality: 0.0,
                local_mean: 0.0,
            }],
        };
        search_refine(
            &wav,
            &analyzer,
            &params,
            Mode::Block,
            &mut key_result,
            &schedule,
            (0, wav.n_values()),
        );
        assert_eq!(key_result.scores.len(), 1);
    }
}
