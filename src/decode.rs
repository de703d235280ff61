//! Scoring a single candidate position against a sync schedule
//!
//! [`sync_decode`] is the inner loop of both the coarse and fine search
//! passes: given a start frame and the dB spectrum for the frames around
//! it, it asks "how well does this position match the expected sync
//! pattern for this key?" and returns a single normalized quality value.

use crate::params::{Params, CONSISTENCY_WEIGHT, NORMALIZE_DIVISOR, WATER_DELTA_CAP};
use crate::schedule::SyncSchedule;

/// Scales a raw bit-quality sum into a roughly key-independent range, so a
/// single threshold works regardless of how strong the embedded watermark
/// was.
pub fn normalize_sync_quality(raw_quality: f64, params: &Params) -> f64 {
    let water_delta_factor = params.water_delta.min(WATER_DELTA_CAP);
    raw_quality / water_delta_factor / NORMALIZE_DIVISOR
}

/// Converts one bit's up/down band energy sum into a signed quality in
/// `[-1, 1]`: positive means "this bit decoded as the expected value",
/// negative means it decoded as the opposite.
///
/// The expected bit alternates `0, 1, 0, 1, ...` by bit index.
pub fn bit_quality(umag: f64, dmag: f64, bit: usize) -> f64 {
    let expect_data_bit = bit % 2 == 1;

    let raw_bit = if umag == 0.0 && dmag == 0.0 {
        0.0
    } else if umag < 0.0001 {
        -0.9
    } else if dmag < 0.0001 {
        0.9
    } else if umag < dmag {
        1.0 - (umag / dmag).powf(0.8)
    } else {
        (dmag / umag).powf(0.8) - 1.0
    };

    if expect_data_bit {
        raw_bit
    } else {
        -raw_bit
    }
}

/// Scores a candidate start frame against `sync_bits`, reading band energy
/// out of `fft_out_db` (laid out `[frame * n_bands + band]`) and skipping
/// any frame not marked present in `have_frames`.
pub fn sync_decode(
    sync_bits: &SyncSchedule,
    start_frame: usize,
    fft_out_db: &[f64],
    have_frames: &[bool],
    params: &Params,
) -> f64 {
    let n_bands = params.n_bands();
    let mut bit_count = 0usize;
    let mut bit_qualities = Vec::with_capacity(sync_bits.len());
    let mut sync_quality = 0.0;

    for (bit, frame_bits) in sync_bits.iter().enumerate() {
        let mut umag = 0.0;
        let mut dmag = 0.0;
        let mut frame_bit_count = 0usize;

        for frame_bit in frame_bits {
            let absolute_frame = start_frame + frame_bit.frame;
            if have_frames.get(absolute_frame).copied().unwrap_or(false) {
                let index = absolute_frame * n_bands;
                for &u in &frame_bit.up {
                    umag += fft_out_db[index + u];
                }
                for &d in &frame_bit.down {
                    dmag += fft_out_db[index + d];
                }
                frame_bit_count += 1;
            }
        }

        let bit_q = bit_quality(umag, dmag, bit) * frame_bit_count as f64;
        bit_qualities.push(bit_q);
        sync_quality += bit_q;
        bit_count += frame_bit_count;
    }

    if bit_count > 0 {
        sync_quality /= bit_count as f64;

        if bit_qualities.len() > 1 {
            // Not the mean of `bit_qualities` — this is `sync_quality * bit_count`,
            // i.e. the un-normalized sum before the division above. Reproduced as-is.
            let mean = sync_quality * bit_count as f64;
            let variance = bit_qualities
                .iter()
                .map(|q| (q - mean) * (q - mean))
                .sum::<f64>()
                / bit_qualities.len() as f64;
            let consistency_factor = 1.0 / (1.0 + variance * CONSISTENCY_WEIGHT);
            sync_quality *= consistency_factor;
        }
    }

    normalize_sync_quality(sync_quality, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::FrameBit;

    #[test]
    fn bit_quality_favors_expected_polarity() {
        // bit 1 expects a "1" bit: strong down should score positive.
        assert!(bit_quality(1.0, 10.0, 1) > 0.0);
        // bit 0 expects a "0" bit: strong down should score negative.
        assert!(bit_quality(1.0, 10.0, 0) < 0.0);
    }

    #[test]
    fn bit_quality_is_zero_with_no_signal() {
        assert_eq!(bit_quality(0.0, 0.0, 0), 0.0);
    }

    #[test]
    fn sync_decode_with_no_available_frames_is_zero() {
        let params = Params::default();
        let sync_bits = vec![vec![FrameBit {
            frame: 0,
            up: vec![0],
            down: vec![1],
        }]];
        let fft_db = vec![0.0; params.n_bands()];
        let have_frames = vec![false];
        let q = sync_decode(&sync_bits, 0, &fft_db, &have_frames, &params);
        assert_eq!(q, 0.0);
    }

    #[test]
    fn sync_decode_rewards_matching_pattern() {
        let params = Params::default();
        let sync_bits = vec![
            vec![FrameBit {
                frame: 0,
                up: vec![0],
                down: vec![1],
            }],
            vec![FrameBit {
                frame: 1,
                up: vec![0],
                down: vec![1],
            }],
        ];
        let n_bands = params.n_bands();
        let mut fft_db = vec![0.0; n_bands * 2];
        // bit 0 expects "0": down should dominate.
        fft_db[1] = 10.0;
        // bit 1 expects "1": up should dominate.
        fft_db[n_bands] = 10.0;
        let have_frames = vec![true, true];
        let q = sync_decode(&sync_bits, 0, &fft_db, &have_frames, &params);
        assert!(q > 0.0, "expected positive quality, got {q}");
    }
}
