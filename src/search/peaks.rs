//! Peak selection
//!
//! Three sequential filters narrow the coarse-search score list down to a
//! handful of plausible sync positions before refinement: keep only local
//! maxima, drop ones that are shadows of a much larger opposite-sign
//! neighbor, then keep everything above an adaptive threshold (but never
//! fewer than a floor count).

use crate::params::{
    Mode, Params, CLIP_N_BEST_FLOOR, MASK_DISTANCE, MASK_FACTOR, MIN_RESULTS_FLOOR,
};
use crate::score::SearchScore;

/// Keeps a score only if its absolute quality is at least as large as its
/// four nearest neighbors (two on each side). On acceptance, the next two
/// scores are skipped — they cannot themselves be local maxima relative to
/// the one just kept.
pub fn sync_select_local_maxima(sync_scores: &[SearchScore]) -> Vec<SearchScore> {
    let mut selected = Vec::new();
    let mut i = 0;
    while i < sync_scores.len() {
        let q = sync_scores[i].abs_quality();
        let q_last = if i > 0 { sync_scores[i - 1].abs_quality() } else { 0.0 };
        let q_last2 = if i > 1 { sync_scores[i - 2].abs_quality() } else { 0.0 };
        let q_next = sync_scores.get(i + 1).map(|s| s.abs_quality()).unwrap_or(0.0);
        let q_next2 = sync_scores.get(i + 2).map(|s| s.abs_quality()).unwrap_or(0.0);

        if q >= q_last && q >= q_next && q >= q_last2 && q >= q_next2 {
            selected.push(sync_scores[i]);
            i += 3;
        } else {
            i += 1;
        }
    }
    selected
}

fn quality_sign(score: &SearchScore) -> i32 {
    if score.raw_quality - score.local_mean < 0.0 {
        -1
    } else {
        1
    }
}

/// Drops any score that sits in the shadow of a much larger, opposite-sign
/// neighbor within `mask_distance` (both in list position and in
/// `sync_search_step`-scaled sample distance) — subtracting the local mean
/// around a strong peak biases nearby scores in the opposite direction, and
/// this filter keeps that bias from reading as its own peak.
pub fn sync_mask_avg_false_positives(
    sync_scores: &[SearchScore],
    sync_search_step: usize,
) -> Vec<SearchScore> {
    let mask_distance = MASK_DISTANCE;
    let mut out = Vec::new();

    for (i, score) in sync_scores.iter().enumerate() {
        let mut masked = false;
        for d in -mask_distance..=mask_distance {
            let j = i as i64 + d;
            if d == 0 || j < 0 || j as usize >= sync_scores.len() {
                continue;
            }
            let other = &sync_scores[j as usize];
            let distance =
                (score.index as i64 - other.index as i64).unsigned_abs() as usize / sync_search_step.max(1);
            if distance as i64 <= mask_distance
                && other.abs_quality() > score.abs_quality() * MASK_FACTOR
                && quality_sign(other) != quality_sign(score)
            {
                masked = true;
                break;
            }
        }
        if !masked {
            out.push(*score);
        }
    }
    out
}

/// Sorts descending by absolute quality, keeps everything above an
/// adaptively-lowered threshold, but never fewer than
/// `max(get_n_best, min_results_floor)` scores (when that many are
/// available at all).
pub fn sync_select_threshold_and_n_best(
    sync_scores: &mut Vec<SearchScore>,
    threshold: f64,
    params: &Params,
) {
    sync_scores.sort_by(|a, b| b.abs_quality().partial_cmp(&a.abs_quality()).unwrap());

    let adjusted_threshold = if !sync_scores.is_empty() && sync_scores[0].abs_quality() < threshold
    {
        (threshold * 0.6).max(sync_scores[0].abs_quality() * 0.9)
    } else {
        threshold
    };

    let mut above_threshold = 0;
    while above_threshold < sync_scores.len()
        && sync_scores[above_threshold].abs_quality() > adjusted_threshold
    {
        above_threshold += 1;
    }

    let min_results = params.get_n_best.max(MIN_RESULTS_FLOOR);
    if above_threshold >= min_results {
        sync_scores.truncate(above_threshold);
    } else if sync_scores.len() > min_results {
        sync_scores.truncate(min_results);
    }
}

/// Sorts descending by absolute quality and keeps only the top `n`.
pub fn sync_select_truncate_n(sync_scores: &mut Vec<SearchScore>, n: usize) {
    sync_scores.sort_by(|a, b| b.abs_quality().partial_cmp(&a.abs_quality()).unwrap());
    sync_scores.truncate(n);
}

/// The CLIP-mode truncation floor: `max(get_n_best, clip_n_best_floor)`.
pub fn clip_truncate_n(params: &Params, mode: Mode) -> Option<usize> {
    match mode {
        Mode::Clip => Some(params.get_n_best.max(CLIP_N_BEST_FLOOR)),
        Mode::Block => None,
    }
}
