//! Score types produced by the search pipeline
//!
//! `SearchScore` is the working representation used while scores are still
//! being refined (it carries the local-mean bias alongside the raw
//! quality); `Score` is the public, bias-subtracted result returned to
//! callers of [`crate::search`].

/// One candidate sync position, before local-mean bias subtraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchScore {
    pub index: usize,
    pub raw_quality: f64,
    pub local_mean: f64,
}

impl SearchScore {
    /// `|raw_quality - local_mean|`, the value peak selection operates on.
    pub fn abs_quality(&self) -> f64 {
        (self.raw_quality - self.local_mean).abs()
    }
}

/// The full working state for one key during search: its schedule-derived
/// scores before and after refinement.
#[derive(Debug, Clone)]
pub struct SearchKeyResult {
    pub key: crate::key::Key,
    pub scores: Vec<SearchScore>,
}

/// Which half of a long block (or which polarity of a single block) a
/// position was classified as.
///
/// The schedule in [`crate::schedule::get_sync_bits`] swaps up/down bands
/// for the second half of a [`crate::params::Mode::Clip`] pattern, so a
/// positive bias-subtracted quality means the first-block pattern matched
/// ([`BlockType::A`]) and a negative one means the swapped, second-block
/// pattern matched ([`BlockType::B`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    A,
    B,
}

/// One accepted sync position in the final result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub index: usize,
    pub quality: f64,
    pub block_type: BlockType,
}

/// All accepted sync positions found for one key.
#[derive(Debug, Clone)]
pub struct KeyResult {
    pub key: crate::key::Key,
    pub sync_scores: Vec<Score>,
}
