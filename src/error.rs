//! Error types for the sync finder
//!
//! One `snafu`-derived enum covering every fallible boundary in this crate,
//! rather than stringly-typed errors.

use snafu::Snafu;

/// Errors that can occur while validating configuration or loading audio
/// fixtures. The core search pipeline itself is total on well-formed inputs
/// (see the module-level docs on [`crate::search`]) — these variants only
/// guard the public construction boundary.
#[derive(Debug, Snafu)]
pub enum SyncFinderError {
    /// `min_band` must be strictly less than `max_band`
    #[snafu(display("min_band ({min_band}) must be less than max_band ({max_band})"))]
    InvalidBandRange { min_band: usize, max_band: usize },

    /// `sync_bits` and `sync_frames_per_bit` must both be nonzero
    #[snafu(display("sync_bits and sync_frames_per_bit must both be nonzero"))]
    EmptySyncSchedule,

    /// `frame_size` must be nonzero
    #[snafu(display("frame_size must be nonzero"))]
    ZeroFrameSize,

    /// Failed to read a WAV file used as a test fixture
    #[snafu(display("failed to read wav file '{path}': {source}"))]
    WavRead {
        path: String,
        source: hound::Error,
    },

    /// Failed to write a WAV file used as a test fixture
    #[snafu(display("failed to write wav file '{path}': {source}"))]
    WavWrite {
        path: String,
        source: hound::Error,
    },
}

pub type Result<T, E = SyncFinderError> = std::result::Result<T, E>;
