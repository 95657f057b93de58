//! LZMA probability model: arena layout, length encoder and slot helpers.
//!
//! Every adaptive probability cell of the encoder lives in one flat `u16`
//! arena so that the range coder's deferred queue can address cells by
//! plain index (see [`crate::rc`]). The fixed-size arrays sit at constant
//! offsets; the literal table is last because its size depends on
//! `lc + lp`.
//!
//! Layout (cell offsets):
//!
//! | array            | shape        | offset          |
//! |------------------|--------------|-----------------|
//! | `is_match`       | `[12][16]`   | 0               |
//! | `is_rep`         | `[12]`       | 192             |
//! | `is_rep_g0`      | `[12]`       | 204             |
//! | `is_rep_g1`      | `[12]`       | 216             |
//! | `is_rep_g2`      | `[12]`       | 228             |
//! | `is_rep0_long`   | `[12][16]`   | 240             |
//! | `pos_slot`       | `[4][64]`    | 432             |
//! | `pos_encoders`   | `[128]`      | 688             |
//! | `pos_align`      | `[16]`       | 816             |
//! | `len` low/high   | `[256]+[256]`| 832 / 1088      |
//! | rep len low/high | `[256]+[256]`| 1344 / 1600     |
//! | `literal`        | `0x300 << (lc+lp)` | 1856      |
//!
//! The length coder's choice bits reuse the otherwise-unused root slots of
//! the pos-state-0 low and mid trees (`low[0]` and `low[8]`), and distance
//! footer bits index `pos_encoders` at `base + tree_node`. Each context
//! still maps to exactly one cell, so streams stay decodable by standard
//! LZMA decoders.

use crate::error::{Error, Result};
use crate::rc::{PROB_INIT, RangeEncoder};
use crate::util;

/// Number of states in the LZMA history automaton.
pub(crate) const NUM_STATES: usize = 12;
/// Maximum number of position states (`1 << pb` with `pb <= 4`).
pub(crate) const NUM_POS_STATES_MAX: usize = 1 << 4;
/// Number of remembered match distances.
pub(crate) const NUM_REPS: usize = 4;

/// Minimum encodable match length.
pub(crate) const MATCH_LEN_MIN: u32 = 2;

const LEN_NUM_LOW_BITS: u32 = 3;
const LEN_NUM_LOW_SYMBOLS: u32 = 1 << LEN_NUM_LOW_BITS;
const LEN_NUM_HIGH_BITS: u32 = 8;
const LEN_NUM_HIGH_SYMBOLS: usize = 1 << LEN_NUM_HIGH_BITS;
const LEN_LOW_TABLE: usize = NUM_POS_STATES_MAX << (LEN_NUM_LOW_BITS as usize + 1);

/// Number of length buckets used as distance-slot context.
const NUM_LEN_TO_POS_STATES: u32 = 4;
pub(crate) const NUM_POS_SLOT_BITS: u32 = 6;

/// First distance slot with footer bits.
pub(crate) const START_POS_MODEL_INDEX: u32 = 4;
const END_POS_MODEL_INDEX: u32 = 14;
/// Distances below this use the modeled footer tree; larger ones use
/// direct bits plus the alignment tree.
pub(crate) const NUM_FULL_DISTANCES: u32 = 1 << (END_POS_MODEL_INDEX >> 1);

pub(crate) const NUM_ALIGN_BITS: u32 = 4;
pub(crate) const ALIGN_MASK: u32 = (1 << NUM_ALIGN_BITS) - 1;

// Arena offsets.
const IS_MATCH: usize = 0;
const IS_REP: usize = IS_MATCH + NUM_STATES * NUM_POS_STATES_MAX;
const IS_REP_G0: usize = IS_REP + NUM_STATES;
const IS_REP_G1: usize = IS_REP_G0 + NUM_STATES;
const IS_REP_G2: usize = IS_REP_G1 + NUM_STATES;
const IS_REP0_LONG: usize = IS_REP_G2 + NUM_STATES;
const POS_SLOT: usize = IS_REP0_LONG + NUM_STATES * NUM_POS_STATES_MAX;
const POS_ENCODERS: usize = POS_SLOT + (NUM_LEN_TO_POS_STATES as usize) * (1 << NUM_POS_SLOT_BITS);
const POS_ALIGN: usize = POS_ENCODERS + NUM_FULL_DISTANCES as usize;
const LEN_LOW: usize = POS_ALIGN + (1 << NUM_ALIGN_BITS);
const LEN_HIGH: usize = LEN_LOW + LEN_LOW_TABLE;
const REP_LEN_LOW: usize = LEN_HIGH + LEN_NUM_HIGH_SYMBOLS;
const REP_LEN_HIGH: usize = REP_LEN_LOW + LEN_LOW_TABLE;
/// Start of the literal table; everything before it is fixed-size.
pub(crate) const LITERAL: usize = REP_LEN_HIGH + LEN_NUM_HIGH_SYMBOLS;

/// State table applied after emitting a literal.
pub(crate) const LITERAL_NEXT_STATES: [usize; NUM_STATES] = [0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 4, 5];

/// True when the most recent symbol in `state` was a literal.
#[inline]
pub(crate) fn is_literal_state(state: usize) -> bool {
    state < 7
}

#[inline]
pub(crate) fn is_match_idx(state: usize, pos_state: u32) -> u32 {
    (IS_MATCH + state * NUM_POS_STATES_MAX) as u32 + pos_state
}

#[inline]
pub(crate) fn is_rep_idx(state: usize) -> u32 {
    (IS_REP + state) as u32
}

#[inline]
pub(crate) fn is_rep_g0_idx(state: usize) -> u32 {
    (IS_REP_G0 + state) as u32
}

#[inline]
pub(crate) fn is_rep_g1_idx(state: usize) -> u32 {
    (IS_REP_G1 + state) as u32
}

#[inline]
pub(crate) fn is_rep_g2_idx(state: usize) -> u32 {
    (IS_REP_G2 + state) as u32
}

#[inline]
pub(crate) fn is_rep0_long_idx(state: usize, pos_state: u32) -> u32 {
    (IS_REP0_LONG + state * NUM_POS_STATES_MAX) as u32 + pos_state
}

#[inline]
pub(crate) fn pos_slot_base(len_state: u32) -> u32 {
    POS_SLOT as u32 + (len_state << NUM_POS_SLOT_BITS)
}

#[inline]
pub(crate) fn pos_encoders_base(base: u32) -> u32 {
    POS_ENCODERS as u32 + base
}

#[inline]
pub(crate) fn pos_align_base() -> u32 {
    POS_ALIGN as u32
}

/// Maps a zero-based distance to its 6-bit slot: the slot encodes the two
/// leading significant bits, the rest become footer bits.
pub(crate) fn get_pos_slot(dist: u32) -> u32 {
    if dist <= 4 {
        dist
    } else {
        let zz = util::fls(dist) - 1;
        (zz + zz) + ((dist >> (zz - 1)) & 1)
    }
}

/// Length bucket used to pick the distance-slot context.
#[inline]
pub(crate) fn get_len_state(len: u32) -> u32 {
    if len < NUM_LEN_TO_POS_STATES - 1 + MATCH_LEN_MIN {
        len - MATCH_LEN_MIN
    } else {
        NUM_LEN_TO_POS_STATES - 1
    }
}

/// Match/rep length encoder over one low/high table pair.
///
/// Lengths are encoded as `sym = len - 2`:
/// - `sym < 8`: choice=0 and a 3-bit tree per position state;
/// - `sym < 16`: choice=1, choice2=0 and a second 3-bit tree;
/// - otherwise: both choices set and an 8-bit tree for `sym - 16`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LenEncoder {
    low: u32,
    high: u32,
}

impl LenEncoder {
    /// Length encoder for normal matches.
    pub(crate) fn for_match() -> Self {
        Self {
            low: LEN_LOW as u32,
            high: LEN_HIGH as u32,
        }
    }

    /// Length encoder for repeated matches.
    pub(crate) fn for_rep() -> Self {
        Self {
            low: REP_LEN_LOW as u32,
            high: REP_LEN_HIGH as u32,
        }
    }

    pub(crate) fn encode(&self, rc: &mut RangeEncoder, pos_state: u32, len: u32) {
        let mut sym = len - MATCH_LEN_MIN;
        let mut probs = self.low;

        if sym >= LEN_NUM_LOW_SYMBOLS {
            rc.bit(probs, 1);
            probs += LEN_NUM_LOW_SYMBOLS;
            if sym >= LEN_NUM_LOW_SYMBOLS * 2 {
                rc.bit(probs, 1);
                rc.bittree(self.high, LEN_NUM_HIGH_BITS, sym - LEN_NUM_LOW_SYMBOLS * 2);
                return;
            }
            sym -= LEN_NUM_LOW_SYMBOLS;
        }
        rc.bit(probs, 0);
        rc.bittree(
            probs + (pos_state << (LEN_NUM_LOW_BITS + 1)),
            LEN_NUM_LOW_BITS,
            sym,
        );
    }
}

/// The probability arena. Sized by `lc + lp` at reset; every cell starts at
/// [`PROB_INIT`].
pub(crate) struct Probs {
    mem: Vec<u16>,
    lclp: u32,
}

impl Probs {
    pub(crate) fn new() -> Self {
        Self {
            mem: Vec::new(),
            lclp: u32::MAX,
        }
    }

    /// (Re)initializes all cells, reallocating when `lc + lp` changed.
    pub(crate) fn reset(&mut self, lclp: u32) -> Result<()> {
        let total = LITERAL + (0x300usize << lclp);
        if self.lclp != lclp {
            let mut mem = Vec::new();
            mem.try_reserve_exact(total).map_err(|_| Error::OutOfMemory)?;
            mem.resize(total, PROB_INIT);
            self.mem = mem;
            self.lclp = lclp;
        } else {
            self.mem.fill(PROB_INIT);
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn mem_mut(&mut self) -> &mut [u16] {
        &mut self.mem
    }

    #[cfg(test)]
    pub(crate) fn get(&self, idx: u32) -> u16 {
        self.mem[idx as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_slot_small_distances() {
        for d in 0..=4 {
            assert_eq!(get_pos_slot(d), d);
        }
    }

    #[test]
    fn test_pos_slot_groups() {
        assert_eq!(get_pos_slot(5), 4);
        assert_eq!(get_pos_slot(6), 5);
        assert_eq!(get_pos_slot(7), 5);
        assert_eq!(get_pos_slot(8), 6);
        assert_eq!(get_pos_slot(11), 6);
        assert_eq!(get_pos_slot(12), 7);
        assert_eq!(get_pos_slot(15), 7);
        assert_eq!(get_pos_slot(16), 8);
        assert_eq!(get_pos_slot(127), 13);
        assert_eq!(get_pos_slot(u32::MAX), 63);
    }

    #[test]
    fn test_len_state_buckets() {
        assert_eq!(get_len_state(2), 0);
        assert_eq!(get_len_state(3), 1);
        assert_eq!(get_len_state(4), 2);
        assert_eq!(get_len_state(5), 3);
        assert_eq!(get_len_state(273), 3);
    }

    #[test]
    fn test_arena_offsets_disjoint() {
        assert_eq!(IS_REP, 192);
        assert_eq!(POS_SLOT, 432);
        assert_eq!(POS_ENCODERS, 688);
        assert_eq!(POS_ALIGN, 816);
        assert_eq!(LITERAL, 1856);
    }

    #[test]
    fn test_probs_reset_fills_init() {
        let mut probs = Probs::new();
        probs.reset(3).unwrap();
        assert_eq!(probs.mem.len(), LITERAL + (0x300 << 3));
        assert!(probs.mem.iter().all(|&p| p == PROB_INIT));
    }

    #[test]
    fn test_probs_reset_keeps_allocation_for_same_lclp() {
        let mut probs = Probs::new();
        probs.reset(2).unwrap();
        probs.mem[0] = 1;
        let len = probs.mem.len();
        probs.reset(2).unwrap();
        assert_eq!(probs.mem.len(), len);
        assert_eq!(probs.mem[0], PROB_INIT);
    }

    #[test]
    fn test_len_encoder_low_mid_high_paths() {
        let mut probs = Probs::new();
        probs.reset(0).unwrap();
        let mut rc = RangeEncoder::new();
        let enc = LenEncoder::for_match();

        // One length from each tree; all three must queue and drain.
        enc.encode(&mut rc, 0, 2);
        enc.encode(&mut rc, 1, 12);
        enc.encode(&mut rc, 2, 100);
        rc.flush();

        let mut out = vec![0u8; 64];
        let mut op = 0;
        rc.encode(probs.mem_mut(), &mut out, &mut op).unwrap();
        assert!(op >= 5);
        // Choice cell (low[0]) saw a zero then ones.
        assert_ne!(probs.get(LEN_LOW as u32), PROB_INIT);
        // High tree root was touched by the len=100 encoding.
        assert_ne!(probs.get(LEN_HIGH as u32 + 1), PROB_INIT);
    }
}
