//! Sync bit schedule
//!
//! [`get_sync_bits`] turns a key into the concrete set of `(frame, up bands,
//! down bands)` assignments that [`crate::decode::sync_decode`] scores
//! against. It is the bridge between the opaque [`crate::prng`] streams and
//! the frame-indexed layout a block actually has on disk.

use crate::key::Key;
use crate::params::{Mode, Params};
use crate::prng::{BitPosGen, Stream, UpDownGen};

/// One frame's contribution to one logical sync bit: which bands in that
/// frame should read "up" (more energy) vs. "down" (less energy) for the
/// bit to be a `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBit {
    pub frame: usize,
    pub up: Vec<usize>,
    pub down: Vec<usize>,
}

/// All frame contributions for one logical sync bit, sorted by frame index.
pub type BitSchedule = Vec<FrameBit>;

/// The full sync pattern for a key: one [`BitSchedule`] per sync bit.
pub type SyncSchedule = Vec<BitSchedule>;

/// Builds the sync schedule for `key` under `mode`.
///
/// In [`Mode::Clip`] the pattern is duplicated for a second block immediately
/// following the first, with "up" and "down" swapped — this is what lets a
/// clip's second half be recognized as the opposite polarity of its first
/// (see [`crate::score::BlockType`]).
pub fn get_sync_bits(key: Key, params: &Params, mode: Mode) -> SyncSchedule {
    let first_block_end = params.mark_sync_frame_count() + params.mark_data_frame_count;
    let block_count = if mode == Mode::Block { 1 } else { 2 };

    let up_down_gen = UpDownGen::new(key, Stream::SyncUpDown, params.min_band, params.max_band);
    let total_frames = match mode {
        Mode::Block => first_block_end,
        Mode::Clip => first_block_end * 2,
    };
    let bit_pos_gen = BitPosGen::new(key, total_frames);

    let mut sync_bits = Vec::with_capacity(params.sync_bits);
    for bit in 0..params.sync_bits {
        let mut frame_bits = Vec::with_capacity(params.sync_frames_per_bit * block_count);
        for f in 0..params.sync_frames_per_bit {
            let logical_frame = f + bit * params.sync_frames_per_bit;
            let (frame_up, frame_down) = up_down_gen.get(logical_frame);

            for block in 0..block_count {
                let frame = bit_pos_gen.sync_frame(logical_frame) + block * first_block_end;

                let (mut up, mut down) = if block == 0 {
                    (
                        frame_up.iter().map(|u| u - params.min_band).collect::<Vec<_>>(),
                        frame_down.iter().map(|d| d - params.min_band).collect::<Vec<_>>(),
                    )
                } else {
                    (
                        frame_down.iter().map(|d| d - params.min_band).collect::<Vec<_>>(),
                        frame_up.iter().map(|u| u - params.min_band).collect::<Vec<_>>(),
                    )
                };
                up.sort_unstable();
                down.sort_unstable();
                frame_bits.push(FrameBit { frame, up, down });
            }
        }
        frame_bits.sort_by_key(|fb| fb.frame);
        sync_bits.push(frame_bits);
    }
    sync_bits
}
