//! Key-derived pseudo-random streams
//!
//! The sync pattern embedded in a watermark is not a fixed set of bands and
//! frame slots — it is derived from the key so that only a holder of the key
//! can predict where to look. [`UpDownGen`] and [`BitPosGen`] are the two
//! derivation streams [`crate::schedule`] consumes: one picks which bands
//! carry the "up" and "down" tones for a frame, the other picks which frame
//! slots within a block carry sync data at all.
//!
//! Both are seeded from the key plus a small stream tag, so two streams
//! drawn from the same key never collide and the same `(key, tag)` pair
//! always reproduces the same sequence.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::key::Key;

/// Distinguishes the independent PRNG streams derived from one key, so that
/// e.g. the up/down band assignment and the frame permutation don't draw
/// from the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    SyncUpDown,
}

fn stream_seed(key: Key, stream: Stream, salt: u64) -> u64 {
    let tag = match stream {
        Stream::SyncUpDown => 0x5379_6e63_5544u64,
    };
    key.0
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(tag)
        .wrapping_add(salt.wrapping_mul(0xBF58_476D_1CE4_E5B9))
}

fn rng_for(key: Key, stream: Stream, salt: u64) -> StdRng {
    StdRng::seed_from_u64(stream_seed(key, stream, salt))
}

/// Generates the up/down band split for each frame a sync bit touches.
///
/// For frame index `f`, [`UpDownGen::get`] returns a disjoint pair of band
/// indices within `[min_band, max_band]`: bands expected to carry more
/// energy than their neighbor ("up") and bands expected to carry less
/// ("down"). Both lists are drawn from the same seeded shuffle of the band
/// range, so a band never appears in both.
pub struct UpDownGen {
    key: Key,
    stream: Stream,
    min_band: usize,
    max_band: usize,
    bands_per_frame: usize,
}

impl UpDownGen {
    pub fn new(key: Key, stream: Stream, min_band: usize, max_band: usize) -> Self {
        let bands_per_frame = ((max_band - min_band + 1) / 4).max(1);
        Self {
            key,
            stream,
            min_band,
            max_band,
            bands_per_frame,
        }
    }

    /// Returns `(up_bands, down_bands)` for the given frame index, both
    /// sorted ascending and disjoint.
    pub fn get(&self, frame_index: usize) -> (Vec<usize>, Vec<usize>) {
        let mut rng = rng_for(self.key, self.stream, frame_index as u64);
        let mut bands: Vec<usize> = (self.min_band..=self.max_band).collect();
        bands.shuffle(&mut rng);

        let take = (self.bands_per_frame * 2).min(bands.len());
        let mut up: Vec<usize> = bands[..take / 2].to_vec();
        let mut down: Vec<usize> = bands[take / 2..take].to_vec();
        up.sort_unstable();
        down.sort_unstable();
        (up, down)
    }
}

/// Assigns logical sync-bit positions to physical frame slots within a
/// block.
///
/// The schedule builder asks `bit_pos_gen.sync_frame(i)` for the `i`-th
/// logical frame a sync bit occupies; `BitPosGen` answers with a fixed
/// permutation of `[0, total_frame_count)` computed once at construction,
/// so that calling it repeatedly (once per bit, per sync pattern) is
/// consistent within a single key.
pub struct BitPosGen {
    permutation: Vec<usize>,
}

impl BitPosGen {
    pub fn new(key: Key, total_frame_count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(key.0 ^ 0xB17_F053_C0DE_u64);
        let mut permutation: Vec<usize> = (0..total_frame_count).collect();
        permutation.shuffle(&mut rng);
        Self { permutation }
    }

    /// Physical frame slot for logical sync-frame index `i`.
    pub fn sync_frame(&self, i: usize) -> usize {
        self.permutation[i % self.permutation.len().max(1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_down_gen_is_deterministic_for_same_key() {
        let a = UpDownGen::new(Key::new(42), Stream::SyncUpDown, 20, 60);
        let b = UpDownGen::new(Key::new(42), Stream::SyncUpDown, 20, 60);
        assert_eq!(a.get(3), b.get(3));
    }

    #[test]
    fn up_down_gen_differs_across_keys() {
        let a = UpDownGen::new(Key::new(1), Stream::SyncUpDown, 20, 60);
        let b = UpDownGen::new(Key::new(2), Stream::SyncUpDown, 20, 60);
        assert_ne!(a.get(0), b.get(0));
    }

    #[test]
    fn up_down_bands_are_disjoint_and_in_range() {
        let gen = UpDownGen::new(Key::new(7), Stream::SyncUpDown, 20, 60);
        let (up, down) = gen.get(5);
        for b in up.iter().chain(down.iter()) {
            assert!((20..=60).contains(b));
        }
        assert!(up.iter().all(|b| !down.contains(b)));
    }

    #[test]
    fn bit_pos_gen_is_a_permutation() {
        let gen = BitPosGen::new(Key::new(9), 32);
        let mut slots: Vec<usize> = (0..32).map(|i| gen.sync_frame(i)).collect();
        slots.sort_unstable();
        assert_eq!(slots, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn bit_pos_gen_is_deterministic_for_same_key() {
        let a = BitPosGen::new(Key::new(9), 32);
        let b = BitPosGen::new(Key::new(9), 32);
        assert_eq!(a.sync_frame(5), b.sync_frame(5));
    }
}
