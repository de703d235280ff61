//! Synchronization finder for an audio watermarking system.
//!
//! Given a key, an audio buffer, and [`Params`], [`search::SyncFinder`]
//! locates the sample-accurate positions of watermark blocks and classifies
//! each as polarity A or B. It does not demodulate the watermark payload,
//! perform error correction, or parse any file format — those are the
//! surrounding decoder's job; this crate only answers "where, and which
//! polarity".

pub mod decode;
pub mod error;
pub mod fft;
pub mod grid;
pub mod key;
pub mod params;
pub mod prng;
pub mod schedule;
pub mod score;
pub mod search;
pub mod threadpool;
pub mod tracing_init;
pub mod wav;

pub use error::{Result, SyncFinderError};
pub use key::Key;
pub use params::{Mode, Params};
pub use score::{BlockType, KeyResult, Score};
pub use search::SyncFinder;
pub use wav::WavData;
