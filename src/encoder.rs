//! LZMA1 encoder: state machine, fast parser, symbol emission and driver.
//!
//! The encoder owns the match finder, the range coder and the probability
//! arena. Each driver step asks the parser for a decision — a run of
//! literals optionally followed by one match — and feeds it to the symbol
//! emitter, which queues range-coder operations and drains them into the
//! caller's output buffer.
//!
//! The parser is the "fast" greedy heuristic with one byte of lookahead:
//! it prefers repeat distances, commits anything reaching `nice_len`
//! immediately, and otherwise peeks at the next position to decide whether
//! deferring by one literal buys a better match. It never prices symbols;
//! there is no optimal parse here.
//!
//! Suspension: when the output buffer fills mid-decision the unemitted
//! remainder of that decision is kept in [`LzmaEncoder::pending`] and the
//! parser is *not* re-run on resume, so a suspended stream is byte-for-byte
//! identical to an uninterrupted one.

use log::trace;

use crate::error::{Error, Result};
use crate::mf::{MATCH_LEN_MAX, Match, MatchFinder, MfProperties};
use crate::model::{
    self, LITERAL, LenEncoder, MATCH_LEN_MIN, NUM_REPS, Probs, is_literal_state,
};
use crate::rc::RangeEncoder;
use crate::util;

/// Largest accepted dictionary size.
pub const DICT_SIZE_MAX: u32 = 1 << 31;

/// Sentinel `back` value marking a literal in the symbol emitter.
const MARK_LIT: u32 = u32::MAX;

/// Encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    /// Literal context bits, `0..=8` with `lc + lp <= 4`.
    pub lc: u32,
    /// Literal position bits, `0..=4`.
    pub lp: u32,
    /// Position bits, `0..=4`.
    pub pb: u32,
    /// Match finder parameters.
    pub mf: MfProperties,
}

impl Properties {
    /// Default parameters for a 0–9 compression level.
    ///
    /// `lc/lp/pb` stay at the classic `3/0/2`; the level picks the
    /// dictionary size, `nice_len` (32 below level 7, 64 above) and the
    /// chain depth derived from it. Levels above 9 clamp to 9.
    pub fn for_level(level: u32) -> Self {
        let level = level.min(9);
        let nice_len = if level < 7 { 32 } else { 64 };
        let dict_size = match level {
            0 => 1 << 16,
            1 => 1 << 18,
            2 => 1 << 19,
            3 => 1 << 20,
            4 => 1 << 21,
            5 => 1 << 22,
            6 => 1 << 23,
            7 => 1 << 24,
            8 => 1 << 25,
            _ => 1 << 26,
        };
        Self {
            lc: 3,
            lp: 0,
            pb: 2,
            mf: MfProperties {
                dict_size,
                nice_len,
                depth: (16 + nice_len / 2) / 2,
            },
        }
    }

    /// The `.lzma` container properties byte: `(pb * 5 + lp) * 9 + lc`.
    pub fn props_byte(&self) -> u8 {
        ((self.pb * 5 + self.lp) * 9 + self.lc) as u8
    }

    /// Checks all parameters against their accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if self.lc > 8 {
            return Err(Error::InvalidParameter("lc out of range (0..=8)".into()));
        }
        if self.lp > 4 {
            return Err(Error::InvalidParameter("lp out of range (0..=4)".into()));
        }
        if self.pb > 4 {
            return Err(Error::InvalidParameter("pb out of range (0..=4)".into()));
        }
        if self.lc + self.lp > 4 {
            return Err(Error::InvalidParameter("lc + lp must not exceed 4".into()));
        }
        if self.mf.dict_size == 0 {
            return Err(Error::InvalidParameter(
                "dictionary size must be non-zero".into(),
            ));
        }
        if self.mf.dict_size > DICT_SIZE_MAX {
            return Err(Error::InvalidParameter(
                "dictionary size exceeds 2^31".into(),
            ));
        }
        if !(5..=MATCH_LEN_MAX).contains(&self.mf.nice_len) {
            return Err(Error::InvalidParameter(
                "nice_len out of range (5..=273)".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self::for_level(5)
    }
}

/// Outcome of an [`LzmaEncoder::encode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// All buffered input was consumed; with `finish` the stream is
    /// terminated (end marker emitted and range coder flushed).
    Finished,
    /// Fewer than four bytes of input remain and `finish` was not set.
    /// Append more data with [`LzmaEncoder::fill`] and call again.
    NeedInput,
    /// The output buffer filled up. Encoder state is fully preserved;
    /// call again with more room to continue exactly where it stopped.
    OutputFull,
}

/// One parser decision: `nliterals` literal bytes, then (when `len > 0`)
/// a match. `back < 4` selects a repeat distance, otherwise the match is
/// a normal one with zero-based distance `back - 4`.
#[derive(Debug, Clone, Copy)]
struct Sequence {
    nliterals: u32,
    back: u32,
    len: u32,
}

impl Sequence {
    fn literal() -> Self {
        Self {
            nliterals: 1,
            back: 0,
            len: 0,
        }
    }
}

#[inline]
fn change_pair(small_dist: u32, big_dist: u32) -> bool {
    (big_dist >> 7) > small_dist
}

/// The LZMA1 stream encoder.
///
/// Feed input with [`fill`](Self::fill), drain compressed bytes with
/// [`encode`](Self::encode). The emitted payload is raw LZMA1 (no
/// container header); see [`crate::stream`] for `.lzma` framing.
pub struct LzmaEncoder {
    mf: MatchFinder,
    rc: RangeEncoder,
    probs: Probs,

    /// True once the caller promised no further input.
    finish: bool,

    /// History automaton state, `0..12`; `< 7` means the previous symbol
    /// was a literal.
    state: usize,
    /// The four most recent match distances (1-based), most recent first.
    reps: [u32; NUM_REPS],

    pb_mask: u32,
    lp_mask: u32,
    lc: u32,
    lp: u32,

    len_enc: LenEncoder,
    rep_len_enc: LenEncoder,

    /// Candidates from the most recent finder call; reused by the parser
    /// when lookahead already covers the next position.
    fast_matches: Vec<Match>,

    /// Decision interrupted by a full output buffer, resumed first.
    pending: Option<Sequence>,
    eopm_queued: bool,
    finished: bool,
}

impl LzmaEncoder {
    /// Creates an encoder ready to accept input for the given parameters.
    pub fn new(props: &Properties) -> Result<Self> {
        let mut enc = Self {
            mf: MatchFinder::new(),
            rc: RangeEncoder::new(),
            probs: Probs::new(),
            finish: false,
            state: 0,
            reps: [1; NUM_REPS],
            pb_mask: 0,
            lp_mask: 0,
            lc: 0,
            lp: 0,
            len_enc: LenEncoder::for_match(),
            rep_len_enc: LenEncoder::for_rep(),
            fast_matches: Vec::new(),
            pending: None,
            eopm_queued: false,
            finished: false,
        };
        enc.reset(props)?;
        Ok(enc)
    }

    /// Reinitializes the encoder for a new stream, discarding buffered
    /// input and resetting every probability to its initial value.
    pub fn reset(&mut self, props: &Properties) -> Result<()> {
        props.validate()?;
        self.mf.reset(&props.mf)?;
        self.rc.reset();
        self.probs.reset(props.lc + props.lp)?;

        self.state = 0;
        self.reps = [1; NUM_REPS];
        self.lc = props.lc;
        self.lp = props.lp;
        self.pb_mask = (1 << props.pb) - 1;
        self.lp_mask = (0x100 << props.lp) - (0x100 >> props.lc);

        self.finish = false;
        self.fast_matches.clear();
        self.pending = None;
        self.eopm_queued = false;
        self.finished = false;
        Ok(())
    }

    /// Appends input bytes. May be called any number of times before and
    /// between [`encode`](Self::encode) calls.
    pub fn fill(&mut self, src: &[u8]) {
        self.mf.fill(src);
    }

    /// Upper bound on the bytes the range coder still owes the output;
    /// useful for sizing the final buffer before a finishing call.
    pub fn pending_bytes(&self) -> u64 {
        self.rc.pending()
    }

    /// Runs the encoder over the buffered input, writing compressed bytes
    /// into `out`. Returns the number of bytes written and a [`Status`].
    ///
    /// With `finish = true` the remaining input is flushed, the
    /// end-of-payload marker is emitted and the range coder is drained;
    /// once `Finished` is returned, further calls write nothing.
    pub fn encode(&mut self, out: &mut [u8], finish: bool) -> (usize, Status) {
        let mut op = 0usize;
        if finish {
            self.finish = true;
        }
        match self.run(out, &mut op) {
            Ok(()) => (op, Status::Finished),
            Err(Error::NeedInput) => (op, Status::NeedInput),
            Err(Error::OutputFull) => (op, Status::OutputFull),
            Err(e) => unreachable!("encoder loop cannot fail with {e}"),
        }
    }

    fn run(&mut self, out: &mut [u8], op: &mut usize) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        loop {
            let decision = match self.pending.take() {
                Some(seq) => Ok(seq),
                None => self.get_optimum_fast(),
            };

            match decision {
                Ok(mut seq) => {
                    trace!(
                        "sequence: pos={} nliterals={} back={} len={}",
                        self.mf.cur - self.mf.lookahead as usize,
                        seq.nliterals,
                        seq.back,
                        seq.len
                    );
                    if let Err(e) = self.encode_sequence(&mut seq, out, op) {
                        // Keep the unemitted remainder; resumed before the
                        // parser runs again.
                        self.pending = Some(seq);
                        return Err(e);
                    }
                }
                Err(Error::NeedInput) => {
                    if !self.finish {
                        return Err(Error::NeedInput);
                    }
                    if !self.eopm_queued {
                        self.rc.encode(self.probs.mem_mut(), out, op)?;
                        self.queue_eopm();
                        self.eopm_queued = true;
                    }
                    self.rc.encode(self.probs.mem_mut(), out, op)?;
                    self.finished = true;
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Emits the pending literals and the trailing match of one decision,
    /// consuming lookahead as symbols complete.
    fn encode_sequence(&mut self, seq: &mut Sequence, out: &mut [u8], op: &mut usize) -> Result<()> {
        while seq.nliterals > 0 {
            self.encode_symbol(MARK_LIT, 0, out, op)?;
            seq.nliterals -= 1;
        }
        if seq.len == 0 {
            return Ok(());
        }
        self.encode_symbol(seq.back, seq.len, out, op)
    }

    /// Drains the range coder, then queues one symbol and accounts for the
    /// bytes it consumes.
    fn encode_symbol(&mut self, back: u32, len: u32, out: &mut [u8], op: &mut usize) -> Result<()> {
        self.rc.encode(self.probs.mem_mut(), out, op)?;

        let position = (self.mf.cur - self.mf.lookahead as usize) as u32;
        let pos_state = position & self.pb_mask;
        let state = self.state;
        let consumed;

        if back == MARK_LIT {
            self.rc.bit(model::is_match_idx(state, pos_state), 0);
            self.emit_literal(position);
            consumed = 1;
        } else {
            self.rc.bit(model::is_match_idx(state, pos_state), 1);
            if back < NUM_REPS as u32 {
                self.rc.bit(model::is_rep_idx(state), 1);
                self.emit_rep(pos_state, back as usize, len);
            } else {
                self.rc.bit(model::is_rep_idx(state), 0);
                self.emit_match(pos_state, back - NUM_REPS as u32, len);
            }
            consumed = len;
        }

        debug_assert!(self.mf.lookahead >= consumed);
        self.mf.lookahead -= consumed;
        Ok(())
    }

    /// Queues one literal byte: a plain bit tree after a literal, or the
    /// match-byte-guided walk after a match.
    fn emit_literal(&mut self, position: u32) {
        let ptr = self.mf.cur - self.mf.lookahead as usize;
        let prev = if ptr == 0 { 0 } else { self.mf.buffer[ptr - 1] };
        let probs = LITERAL as u32
            + 3 * ((((position << 8) + u32::from(prev)) & self.lp_mask) << self.lc);
        let byte = self.mf.buffer[ptr];

        if is_literal_state(self.state) {
            self.rc.bittree(probs, 8, u32::from(byte));
        } else {
            // Walk the bits against the byte at the rep0 distance; as long
            // as they agree, a third probability column is used.
            let match_byte = self.mf.buffer[ptr - self.reps[0] as usize];
            self.literal_matched(probs, u32::from(match_byte), u32::from(byte));
        }
        self.state = model::LITERAL_NEXT_STATES[self.state];
    }

    fn literal_matched(&mut self, probs: u32, match_byte: u32, symbol: u32) {
        let mut offset = 0x100u32;
        let mut match_byte = match_byte;
        let mut symbol = symbol + 0x100;

        loop {
            let bit = (symbol >> 7) & 1;
            match_byte <<= 1;
            let match_bit = match_byte & offset;

            self.rc.bit(probs + offset + match_bit + (symbol >> 8), bit);
            symbol <<= 1;
            offset &= !(match_byte ^ symbol);
            if symbol >= 0x10000 {
                break;
            }
        }
    }

    /// Queues a normal match: length, distance slot, then the footer bits
    /// (modeled below 128, direct + alignment above).
    fn emit_match(&mut self, pos_state: u32, dist: u32, len: u32) {
        let pos_slot = model::get_pos_slot(dist);
        let len_state = model::get_len_state(len);

        self.state = if is_literal_state(self.state) { 7 } else { 10 };
        self.len_enc.encode(&mut self.rc, pos_state, len);

        self.rc
            .bittree(model::pos_slot_base(len_state), model::NUM_POS_SLOT_BITS, pos_slot);

        if dist >= model::START_POS_MODEL_INDEX {
            let footer_bits = (pos_slot >> 1) - 1;
            let base = (2 | (pos_slot & 1)) << footer_bits;

            if dist < model::NUM_FULL_DISTANCES {
                // The reverse tree only reads the low footer bits, which
                // equal those of dist - base.
                self.rc
                    .bittree_reverse(model::pos_encoders_base(base), footer_bits, dist);
            } else {
                let dist_reduced = dist - base;
                self.rc.direct(
                    dist_reduced >> model::NUM_ALIGN_BITS,
                    footer_bits - model::NUM_ALIGN_BITS,
                );
                self.rc.bittree_reverse(
                    model::pos_align_base(),
                    model::NUM_ALIGN_BITS,
                    dist_reduced & model::ALIGN_MASK,
                );
            }
        }

        self.reps[3] = self.reps[2];
        self.reps[2] = self.reps[1];
        self.reps[1] = self.reps[0];
        // The end marker uses dist == u32::MAX; its stored rep wraps and
        // is never used again.
        self.reps[0] = dist.wrapping_add(1);
    }

    /// Queues a repeat match against `reps[rep]`, rotating it to the front.
    fn emit_rep(&mut self, pos_state: u32, rep: usize, len: u32) {
        let state = self.state;

        if rep == 0 {
            self.rc.bit(model::is_rep_g0_idx(state), 0);
            self.rc
                .bit(model::is_rep0_long_idx(state, pos_state), u32::from(len != 1));
        } else {
            let distance = self.reps[rep];
            self.rc.bit(model::is_rep_g0_idx(state), 1);
            if rep == 1 {
                self.rc.bit(model::is_rep_g1_idx(state), 0);
            } else {
                self.rc.bit(model::is_rep_g1_idx(state), 1);
                self.rc.bit(model::is_rep_g2_idx(state), (rep - 2) as u32);

                if rep == 3 {
                    self.reps[3] = self.reps[2];
                }
                self.reps[2] = self.reps[1];
            }
            self.reps[1] = self.reps[0];
            self.reps[0] = distance;
        }

        if len == 1 {
            self.state = if is_literal_state(state) { 9 } else { 11 };
        } else {
            self.rep_len_enc.encode(&mut self.rc, pos_state, len);
            self.state = if is_literal_state(state) { 8 } else { 11 };
        }
    }

    /// Queues the end-of-payload marker (a match at distance `2^32 - 1`,
    /// length 2) followed by the five flush markers.
    fn queue_eopm(&mut self) {
        let position = (self.mf.cur - self.mf.lookahead as usize) as u32;
        let pos_state = position & self.pb_mask;
        let state = self.state;

        self.rc.bit(model::is_match_idx(state, pos_state), 1);
        self.rc.bit(model::is_rep_idx(state), 0);
        self.emit_match(pos_state, u32::MAX, MATCH_LEN_MIN);
        self.rc.flush();
    }

    /// The fast parser: decides how many literals to emit and which match
    /// (if any) follows, advancing the match finder as a side effect.
    fn get_optimum_fast(&mut self) -> Result<Sequence> {
        let nice_len = self.mf.nice_len;

        let matches_count = if self.mf.lookahead == 0 {
            self.mf.find(&mut self.fast_matches, self.finish)?
        } else {
            self.fast_matches.len()
        };

        let ip = self.mf.cur - self.mf.lookahead as usize;
        let iend = self.mf.buffer.len();

        // Nothing to match against, or too little input left to encode one.
        if matches_count == 0 || iend - ip <= 2 {
            return Ok(Sequence::literal());
        }

        let ilimit = iend.min(ip + MATCH_LEN_MAX as usize);

        let mut best_replen = 0u32;
        let mut best_rep = 0usize;

        // Try all four repeat distances; a long repeat wins outright.
        for i in 0..NUM_REPS {
            let rep = self.reps[i] as usize;
            if rep > ip {
                continue;
            }
            let repp = ip - rep;
            let buf = &self.mf.buffer;
            if util::load_u16_le(buf, ip) != util::load_u16_le(buf, repp) {
                continue;
            }
            let len = (util::match_end(buf, ip + 2, repp + 2, ilimit) - ip) as u32;
            if len >= nice_len {
                self.mf.skip(len - 1);
                return Ok(Sequence {
                    nliterals: 0,
                    back: i as u32,
                    len,
                });
            }
            if len > best_replen {
                best_rep = i;
                best_replen = len;
            }
        }

        let mut longest_len = self.fast_matches[matches_count - 1].len;
        let mut longest_back = self.fast_matches[matches_count - 1].dist;

        // A long enough normal match is also taken immediately.
        if longest_len >= nice_len {
            let back = NUM_REPS as u32 + longest_back - 1;
            self.mf.skip(longest_len - 1);
            return Ok(Sequence {
                nliterals: 0,
                back,
                len: longest_len,
            });
        }

        // Trade one byte of length for a much shorter distance.
        let mut mc = matches_count;
        while mc > 1 {
            let victim = self.fast_matches[mc - 2];
            if longest_len > victim.len + 1 {
                break;
            }
            if !change_pair(victim.dist, longest_back) {
                break;
            }
            mc -= 1;
            longest_len = victim.len;
            longest_back = victim.dist;
        }

        if longest_len > best_replen + 1 {
            best_replen = 0;
            // A marginal 2-byte match far away costs more than a literal.
            if longest_len < 3 && longest_back > 0x80 {
                return Ok(Sequence::literal());
            }
        } else {
            longest_len = best_replen;
            longest_back = 0;
        }

        // Lazy step: peek one byte ahead and defer when it pays off.
        let mut nlits = 0u32;
        let mut starved = false;
        loop {
            let ret = match self.mf.find(&mut self.fast_matches, self.finish) {
                Ok(n) => n,
                Err(Error::NeedInput) => {
                    self.fast_matches.clear();
                    starved = true;
                    break;
                }
                Err(e) => return Err(e),
            };
            if ret == 0 {
                break;
            }

            let victim = self.fast_matches[ret - 1];
            if victim.len + 1 < longest_len {
                break;
            }

            let mut len;
            if best_replen == 0 {
                // If a repeat distance covers the next position as well as
                // the current candidate, emit a literal and let the next
                // decision take the cheaper rep.
                let ip1 = ip + nlits as usize + 1;
                let rl = longest_len.saturating_sub(1).max(2) as usize;
                let buf = &self.mf.buffer;
                let rep_covers = (0..NUM_REPS).any(|i| {
                    let rep = self.reps[i] as usize;
                    rep <= ip1 && buf[ip1..ip1 + rl] == buf[ip1 - rep..ip1 - rep + rl]
                });
                if rep_covers {
                    return Ok(Sequence {
                        nliterals: nlits + 1,
                        back: 0,
                        len: 0,
                    });
                }
                len = u32::MAX;
            } else {
                len = 0;
            }

            let mut rep_idx = None;
            for i in 0..NUM_REPS {
                if self.reps[i] == victim.dist {
                    len = victim.len;
                    rep_idx = Some(i);
                    break;
                }
            }

            // A rep in hand only loses to a longer rep one byte later.
            if len <= best_replen {
                break;
            }

            if len == u32::MAX {
                if victim.len + 1 == longest_len && !change_pair(victim.dist, longest_back) {
                    break;
                }
                if victim.len == longest_len
                    && model::get_pos_slot(victim.dist - 1) >= model::get_pos_slot(longest_back)
                {
                    break;
                }
                len = 0;
            }

            longest_len = victim.len;
            longest_back = victim.dist;
            best_replen = len;
            if let Some(i) = rep_idx {
                best_rep = i;
            }
            nlits += 1;
        }

        let back = if best_replen > 0 {
            best_rep as u32
        } else {
            NUM_REPS as u32 + longest_back - 1
        };
        self.mf.skip(longest_len - 2 + u32::from(starved));
        Ok(Sequence {
            nliterals: nlits,
            back,
            len: longest_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> LzmaEncoder {
        LzmaEncoder::new(&Properties {
            lc: 3,
            lp: 0,
            pb: 2,
            mf: MfProperties {
                dict_size: 1 << 16,
                nice_len: 32,
                depth: 4,
            },
        })
        .unwrap()
    }

    #[test]
    fn test_default_properties() {
        let props = Properties::default();
        assert_eq!((props.lc, props.lp, props.pb), (3, 0, 2));
        assert_eq!(props.mf.nice_len, 32);
        assert_eq!(props.mf.depth, 16);
        assert_eq!(props.props_byte(), 0x5D);
    }

    #[test]
    fn test_level_seven_widens_search() {
        let props = Properties::for_level(7);
        assert_eq!(props.mf.nice_len, 64);
        assert_eq!(props.mf.depth, 24);
        assert_eq!(props.mf.dict_size, 1 << 24);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut props = Properties::default();
        props.lc = 9;
        assert!(props.validate().is_err());

        let mut props = Properties::default();
        props.lc = 3;
        props.lp = 2;
        assert!(props.validate().is_err());

        let mut props = Properties::default();
        props.mf.dict_size = 0;
        assert!(props.validate().is_err());

        let mut props = Properties::default();
        props.mf.nice_len = 4;
        assert!(props.validate().is_err());

        let mut props = Properties::default();
        props.mf.nice_len = 274;
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_new_rejects_invalid_properties() {
        let mut props = Properties::default();
        props.pb = 5;
        assert!(matches!(
            LzmaEncoder::new(&props),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_reps_shift_on_normal_match() {
        let mut enc = encoder();
        enc.emit_match(0, 9, 5);
        assert_eq!(enc.reps, [10, 1, 1, 1]);
        enc.emit_match(0, 19, 5);
        assert_eq!(enc.reps, [20, 10, 1, 1]);
    }

    #[test]
    fn test_reps_rotate_on_rep_match() {
        let mut enc = encoder();
        enc.reps = [5, 6, 7, 8];
        enc.emit_rep(0, 2, 3);
        assert_eq!(enc.reps, [7, 5, 6, 8]);
        enc.emit_rep(0, 3, 3);
        assert_eq!(enc.reps, [8, 7, 5, 6]);
        // Rep0 is idempotent on the rep list.
        enc.emit_rep(0, 0, 3);
        assert_eq!(enc.reps, [8, 7, 5, 6]);
    }

    #[test]
    fn test_state_automaton_tracks_literals() {
        let mut enc = encoder();
        enc.mf.fill(b"ab");
        enc.mf.cur = 2;
        enc.mf.lookahead = 1;

        enc.emit_match(0, 0, 2);
        assert_eq!(enc.state, 7);
        assert!(!is_literal_state(enc.state));

        // Matched literal at position 1 (rep0 distance is 1).
        enc.emit_literal(1);
        assert!(enc.state < 7, "literal must return to a literal state");

        enc.emit_rep(0, 1, 4);
        assert_eq!(enc.state, 8);
        enc.emit_rep(0, 0, 1);
        assert_eq!(enc.state, 11);
    }

    #[test]
    fn test_state_stays_in_range_over_random_symbols() {
        let mut enc = encoder();
        enc.mf.fill(&[0u8; 128]);
        enc.mf.cur = 128;
        enc.mf.lookahead = 32;
        enc.reps = [1, 2, 3, 4];

        let mut drain = |enc: &mut LzmaEncoder| {
            let mut out = vec![0u8; 512];
            let mut op = 0;
            enc.rc.encode(enc.probs.mem_mut(), &mut out, &mut op).unwrap();
        };

        for i in 0..48usize {
            match i % 4 {
                0 => enc.emit_literal(i as u32),
                1 => enc.emit_match(0, (i as u32) % 64, 3),
                2 => enc.emit_rep(0, i % 4, 2),
                _ => enc.emit_rep(0, 0, 1),
            }
            assert!(enc.state < 12);
            drain(&mut enc);
        }
    }

    #[test]
    fn test_encode_without_finish_reports_need_input() {
        let mut enc = encoder();
        enc.fill(b"ab");
        let mut out = vec![0u8; 64];
        let (n, status) = enc.encode(&mut out, false);
        assert_eq!(status, Status::NeedInput);
        assert_eq!(n, 0);
    }

    #[test]
    fn test_finish_emits_terminated_stream() {
        let mut enc = encoder();
        enc.fill(b"abcde");
        let mut out = vec![0u8; 64];
        let (n, status) = enc.encode(&mut out, true);
        assert_eq!(status, Status::Finished);
        // Payload plus the 5-byte flush and the end marker.
        assert!(n > 5);

        // Encoding again writes nothing.
        let (n2, status2) = enc.encode(&mut out, true);
        assert_eq!((n2, status2), (0, Status::Finished));
    }

    #[test]
    fn test_tiny_output_buffer_suspends_and_resumes() {
        let data = b"resume resume resume resume resume!";
        let mut whole = encoder();
        whole.fill(data);
        let mut big = vec![0u8; 4096];
        let (n, status) = whole.encode(&mut big, true);
        assert_eq!(status, Status::Finished);
        let reference = &big[..n];

        let mut enc = encoder();
        enc.fill(data);
        let mut collected = Vec::new();
        loop {
            let mut out = [0u8; 3];
            let (n, status) = enc.encode(&mut out, true);
            collected.extend_from_slice(&out[..n]);
            match status {
                Status::Finished => break,
                Status::OutputFull => continue,
                Status::NeedInput => panic!("finish never needs input"),
            }
        }
        assert_eq!(collected, reference);
    }
}
