//! Synchronization search
//!
//! [`SyncFinder::search`] is the public entry point: given a list of keys,
//! an audio buffer, and a [`Mode`], it returns the sample-accurate
//! positions and polarities of every watermark block it can find, one
//! result list per key. Internally it runs the pipeline described on the
//! submodules: [`approx`] scores every plausible offset, [`peaks`] narrows
//! that down to a handful of candidates, and [`refine`] re-scores those at
//! sample precision.

mod approx;
pub mod peaks;
mod refine;

use tracing::{info, instrument};

use crate::fft::FftAnalyzer;
use crate::key::Key;
use crate::params::{Mode, Params};
use crate::schedule::{get_sync_bits, SyncSchedule};
use crate::score::{BlockType, KeyResult, Score, SearchKeyResult};
use crate::wav::WavData;

/// Runs the sync-finding pipeline against a single audio buffer.
///
/// Holds only the configuration and FFT analyzer; the silence bounds
/// computed by [`SyncFinder::scan_silence`] are scratch state recomputed on
/// every [`SyncFinder::search`] call, not persisted across calls.
pub struct SyncFinder<'a> {
    params: Params,
    analyzer: &'a (dyn FftAnalyzer + Sync),
}

impl<'a> SyncFinder<'a> {
    pub fn new(params: Params, analyzer: &'a (dyn FftAnalyzer + Sync)) -> Self {
        Self { params, analyzer }
    }

    /// Finds every watermark block for every key in `key_list`.
    #[instrument(skip(self, key_list, wav_data), fields(n_keys = key_list.len(), mode = ?mode))]
    pub fn search(&self, key_list: &[Key], wav_data: &WavData, mode: Mode) -> Vec<KeyResult> {
        if self.params.test_no_sync {
            return self.fake_sync(key_list, wav_data, mode);
        }

        let silence_range = match mode {
            Mode::Clip => self.scan_silence(wav_data),
            Mode::Block => (0, wav_data.n_values()),
        };

        let mut search_key_results: Vec<SearchKeyResult> = key_list
            .iter()
            .map(|&key| SearchKeyResult {
                key,
                scores: Vec::new(),
            })
            .collect();
        let sync_bits: Vec<SyncSchedule> = key_list
            .iter()
            .map(|&key| get_sync_bits(key, &self.params, mode))
            .collect();

        approx::search_approx(
            &mut search_key_results,
            &sync_bits,
            wav_data,
            self.analyzer,
            &self.params,
            mode,
            silence_range,
        );

        let mut key_results = Vec::with_capacity(search_key_results.len());
        for (k, mut search_key_result) in search_key_results.into_iter().enumerate() {
            search_key_result.scores = peaks::sync_select_local_maxima(&search_key_result.scores);
            search_key_result.scores = peaks::sync_mask_avg_false_positives(
                &search_key_result.scores,
                self.params.sync_search_step,
            );
            peaks::sync_select_threshold_and_n_best(
                &mut search_key_result.scores,
                self.params.sync_threshold2 * 0.75,
                &self.params,
            );

            if let Some(n_max) = peaks::clip_truncate_n(&self.params, mode) {
                peaks::sync_select_truncate_n(&mut search_key_result.scores, n_max);
            }

            refine::search_refine(
                wav_data,
                self.analyzer,
                &self.params,
                mode,
                &mut search_key_result,
                &sync_bits[k],
                silence_range,
            );

            peaks::sync_select_threshold_and_n_best(
                &mut search_key_result.scores,
                self.params.sync_threshold2,
                &self.params,
            );
            search_key_result.scores.sort_by_key(|s| s.index);

            let sync_scores = search_key_result
                .scores
                .iter()
                .map(|search_score| {
                    let q = search_score.raw_quality - search_score.local_mean;
                    Score {
                        index: search_score.index,
                        quality: q.abs(),
                        block_type: if q > 0.0 { BlockType::A } else { BlockType::B },
                    }
                })
                .collect();

            key_results.push(KeyResult {
                key: search_key_result.key,
                sync_scores,
            });
        }

        info!(n_results = key_results.len(), "search complete");
        key_results
    }

    /// Finds the first and one-past-the-last non-zero sample.
    fn scan_silence(&self, wav_data: &WavData) -> (usize, usize) {
        let samples = wav_data.samples();
        let first = samples.iter().position(|&s| s != 0.0).unwrap_or(samples.len());
        let last = samples.iter().rposition(|&s| s != 0.0).map_or(first, |i| i + 1);
        (first, last)
    }

    /// Synthesizes scores at the expected block boundaries instead of
    /// actually searching — used to exercise downstream consumers without
    /// a real embedded watermark.
    fn fake_sync(&self, key_list: &[Key], wav_data: &WavData, mode: Mode) -> Vec<KeyResult> {
        let mut sync_scores = Vec::new();

        if mode == Mode::Block {
            let expect0 = self.params.frames_pad_start * self.params.frame_size;
            let expect_step = self.params.block_frame_count() * self.params.frame_size;
            let expect_end = (wav_data.n_samples() / self.params.frame_size) * self.params.frame_size;

            let mut expect_index = expect0;
            let mut ab = 0usize;
            while expect_index + expect_step < expect_end {
                sync_scores.push(Score {
                    index: expect_index,
                    quality: 1.0,
                    block_type: if ab % 2 == 0 { BlockType::A } else { BlockType::B },
                });
                expect_index += expect_step;
                ab += 1;
            }
        }

        key_list
            .iter()
            .map(|&key| KeyResult {
                key,
                sync_scores: sync_scores.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::RustFftAnalyzer;

    #[test]
    fn empty_buffer_yields_empty_results() {
        let params = Params::default();
        let analyzer = RustFftAnalyzer;
        let finder = SyncFinder::new(params, &analyzer);
        let wav = WavData::from_samples(Vec::new(), 1, 8000);
        let results = finder.search(&[Key::new(1), Key::new(2)], &wav, Mode::Clip);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.sync_scores.is_empty()));
    }

    #[test]
    fn pure_silence_yields_empty_results_in_clip_mode() {
        let params = Params::default().with_frame_size(64).with_band_range(4, 8);
        let analyzer = RustFftAnalyzer;
        let finder = SyncFinder::new(params, &analyzer);
        let wav = WavData::from_samples(vec![0.0; 64 * 200], 1, 8000);
        let results = finder.search(&[Key::new(1)], &wav, Mode::Clip);
        assert!(results[0].sync_scores.is_empty());
    }

    #[test]
    fn fake_sync_in_block_mode_produces_alternating_polarity() {
        let params = Params::default()
            .with_frame_size(1024)
            .with_test_no_sync(true);
        let analyzer = RustFftAnalyzer;
        let finder = SyncFinder::new(params, &analyzer);
        let wav = WavData::from_samples(vec![0.0; 50 * 1024], 1, 8000);
        let results = finder.search(&[Key::new(1)], &wav, Mode::Block);

        let scores = &results[0].sync_scores;
        assert!(!scores.is_empty());
        for (i, score) in scores.iter().enumerate() {
            assert_eq!(score.quality, 1.0);
            let expected = if i % 2 == 0 { BlockType::A } else { BlockType::B };
            assert_eq!(score.block_type, expected);
        }
    }

    #[test]
    fn fake_sync_in_clip_mode_is_empty() {
        let params = Params::default().with_test_no_sync(true);
        let analyzer = RustFftAnalyzer;
        let finder = SyncFinder::new(params, &analyzer);
        let wav = WavData::from_samples(vec![0.0; 50 * 1024], 1, 8000);
        let results = finder.search(&[Key::new(1)], &wav, Mode::Clip);
        assert!(results[0].sync_scores.is_empty());
    }

    #[test]
    fn scan_silence_finds_nonzero_bounds() {
        let params = Params::default();
        let analyzer = RustFftAnalyzer;
        let finder = SyncFinder::new(params, &analyzer);
        let mut samples = vec![0.0; 100];
        samples[10] = 0.5;
        samples[50] = 0.5;
        let wav = WavData::from_samples(samples, 1, 8000);
        let (first, last) = finder.scan_silence(&wav);
        assert_eq!(first, 10);
        assert_eq!(last, 51);
    }

    #[test]
    fn search_results_are_sorted_by_index() {
        let params = Params::default()
            .with_frame_size(1024)
            .with_test_no_sync(true);
        let analyzer = RustFftAnalyzer;
        let finder = SyncFinder::new(params, &analyzer);
        let wav = WavData::from_samples(vec![0.0; 50 * 1024], 1, 8000);
        let results = finder.search(&[Key::new(1)], &wav, Mode::Block);
        let indices: Vec<usize> = results[0].sync_scores.iter().map(|s| s.index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
    }
}
