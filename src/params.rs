//! Sync finder configuration
//!
//! `Params` gathers every knob the detection pipeline in [`crate::search`]
//! reads. It is a plain `Copy` struct with builder-style overrides, plus a
//! handful of domain-tuned constants that are part of the algorithm, not
//! free parameters — see the doc comment on each `const` below for why it
//! is fixed rather than a `Params` field.

/// Whether we are decoding a single known-aligned block, or an arbitrary
/// clip that may contain a "long block" (two consecutive blocks, possibly
/// preceded/followed by silence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One sync pattern per block; no silence trimming, no block doubling.
    Block,
    /// Possibly two consecutive blocks; silence at the edges is trimmed
    /// before scoring.
    Clip,
}

/// Read-only configuration for a [`crate::search::SyncFinder`].
#[derive(Debug, Clone, Copy)]
pub struct Params {
    /// Samples per analysis frame.
    pub frame_size: usize,
    /// First FFT bin (inclusive) watermarking is allowed to touch.
    pub min_band: usize,
    /// Last FFT bin (inclusive) watermarking is allowed to touch.
    pub max_band: usize,
    /// Number of logical sync bits per sync pattern.
    pub sync_bits: usize,
    /// Number of frames that contribute to each sync bit.
    pub sync_frames_per_bit: usize,
    /// Number of frames carrying payload data between sync patterns.
    pub mark_data_frame_count: usize,
    /// Frames of silence/lead-in to skip before the first block (used by
    /// [`crate::search::fake_sync`]).
    pub frames_pad_start: usize,
    /// Coarse search grid, in samples.
    pub sync_search_step: usize,
    /// Refinement search grid, in samples.
    pub sync_search_fine: usize,
    /// Final acceptance threshold on `|raw_quality - local_mean|`.
    pub sync_threshold2: f64,
    /// Minimum number of results the n-best selection keeps.
    pub get_n_best: usize,
    /// Watermark strength delta; feeds `normalize_sync_quality`.
    pub water_delta: f64,
    /// When set, `search()` skips detection and synthesizes scores at the
    /// expected block boundaries (used to test downstream consumers without
    /// a real watermark).
    pub test_no_sync: bool,
}

impl Params {
    /// Number of FFT bins watermarking may use.
    pub fn n_bands(&self) -> usize {
        self.max_band - self.min_band + 1
    }

    /// Frames occupied by one sync pattern.
    pub fn mark_sync_frame_count(&self) -> usize {
        self.sync_bits * self.sync_frames_per_bit
    }

    /// Frames occupied by one full block (sync + data).
    pub fn block_frame_count(&self) -> usize {
        self.mark_sync_frame_count() + self.mark_data_frame_count
    }

    /// Builder-style override, for `Params::default().with_*()` construction
    /// in tests and callers that only need to tweak one or two fields.
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size;
        self
    }

    pub fn with_band_range(mut self, min_band: usize, max_band: usize) -> Self {
        self.min_band = min_band;
        self.max_band = max_band;
        self
    }

    pub fn with_sync_threshold2(mut self, threshold: f64) -> Self {
        self.sync_threshold2 = threshold;
        self
    }

    pub fn with_get_n_best(mut self, n: usize) -> Self {
        self.get_n_best = n;
        self
    }

    pub fn with_test_no_sync(mut self, test_no_sync: bool) -> Self {
        self.test_no_sync = test_no_sync;
        self
    }

    /// Checks the invariants the rest of the pipeline assumes hold.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::{EmptySyncScheduleSnafu, InvalidBandRangeSnafu, ZeroFrameSizeSnafu};
        use snafu::ensure;

        ensure!(
            self.min_band < self.max_band,
            InvalidBandRangeSnafu {
                min_band: self.min_band,
                max_band: self.max_band,
            }
        );
        ensure!(
            self.sync_bits > 0 && self.sync_frames_per_bit > 0,
            EmptySyncScheduleSnafu
        );
        ensure!(self.frame_size > 0, ZeroFrameSizeSnafu);
        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            min_band: 20,
            max_band: 60,
            sync_bits: 6,
            sync_frames_per_bit: 2,
            mark_data_frame_count: 10,
            frames_pad_start: 3,
            sync_search_step: 256,
            sync_search_fine: 8,
            sync_threshold2: 0.5,
            get_n_best: 4,
            water_delta: 0.015,
            test_no_sync: false,
        }
    }
}

/// Window (in score-list positions) used to estimate the local mean and to
/// decide how close two peaks have to be before the false-positive mask
/// considers them related.
///
/// See `DESIGN.md` for how this default was chosen.
pub const LOCAL_MEAN_DISTANCE: i64 = 8;

/// `local_mean_distance + 3`, see [`LOCAL_MEAN_DISTANCE`].
pub const MASK_DISTANCE: i64 = LOCAL_MEAN_DISTANCE + 3;

/// A neighboring peak must be at least this many times larger in magnitude
/// (and of opposite sign) to mask a smaller one.
pub const MASK_FACTOR: f64 = 2.5;

/// Floor under `Params::get_n_best` for the threshold-and-n-best selection.
pub const MIN_RESULTS_FLOOR: usize = 4;

/// Floor under `Params::get_n_best` for the CLIP-mode truncate-n pass.
pub const CLIP_N_BEST_FLOOR: usize = 5;

/// Floor under `Params::sync_search_step / 2` for the coarse search grid.
pub const EFFECTIVE_STEP_FLOOR: usize = 64;

/// Floor under `Params::sync_search_fine / 2` for the refinement grid.
pub const FINE_STEP_FLOOR: usize = 4;

/// Half-width (in score-list positions) of the window used to estimate local
/// noise for the adaptive local-mean window.
pub const NOISE_WINDOW_HALF: i64 = 20;

/// Scores within this many positions of the one being estimated are excluded
/// from its local mean (too strongly correlated with the peak itself).
pub const SELF_EXCLUSION_RADIUS: i64 = 4;

/// Weight applied to the bit-quality variance when penalizing inconsistent
/// sync patterns.
pub const CONSISTENCY_WEIGHT: f64 = 0.1;

/// Divisor in `normalize_sync_quality` after dividing by the capped
/// `water_delta`.
pub const NORMALIZE_DIVISOR: f64 = 2.5;

/// Upper bound applied to `Params::water_delta` before normalizing quality.
pub const WATER_DELTA_CAP: f64 = 0.080;

/// Floor (in dB) applied when converting FFT bin magnitude to log scale.
pub const FFT_DB_FLOOR: f64 = -96.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn n_bands_is_inclusive_range() {
        let params = Params::default().with_band_range(10, 14);
        assert_eq!(params.n_bands(), 5);
    }

    #[test]
    fn invalid_band_range_is_rejected() {
        let params = Params::default().with_band_range(10, 10);
        assert!(params.validate().is_err());
    }

    #[test]
    fn mask_distance_is_local_mean_distance_plus_three() {
        assert_eq!(MASK_DISTANCE, LOCAL_MEAN_DISTANCE + 3);
    }
}
