//! Hash-chain match finder.
//!
//! The finder indexes the input with three hash tables (2-, 3- and 4-byte
//! prefixes) plus a circular chain of previous 4-byte-hash occurrences,
//! the classic HC4 layout. [`MatchFinder::find`] reports candidate
//! matches at the current position in strictly increasing length order and
//! advances the scan cursor by one byte; [`MatchFinder::skip`] commits
//! hashes for bytes the parser consumed without searching.
//!
//! Positions written into the tables carry an `offset` bias of
//! `max_distance + 1`, so a zero cell (never written) can never alias a
//! real occurrence: its apparent distance always exceeds `max_distance`.
//!
//! The 2- and 3-byte buckets only verify the first byte before extending.
//! That is sufficient: the low 8 bits of those hashes are `byte1` (resp.
//! `byte1 ^ byte2 << 8` over 16 bits) XORed with a function of `byte0`
//! alone, so equal bucket + equal first byte pins the remaining prefix
//! bytes too.

use log::debug;

use crate::error::{Error, Result};
use crate::util;

/// Maximum encodable match length.
pub(crate) const MATCH_LEN_MAX: u32 = 273;

const HASH2_SIZE: u32 = 1 << 10;
const HASH3_SIZE: u32 = 1 << 16;
const HASH3_BASE: usize = HASH2_SIZE as usize;
const HASH4_BASE: usize = (HASH2_SIZE + HASH3_SIZE) as usize;

const GOLDEN_RATIO_32: u32 = 0x61C8_8647;

/// Raw CRC-32 byte table (reflected polynomial); the 2/3-byte hashes mix
/// the first input byte through it.
const CRC32_BYTE_TABLE: [u32; 256] = build_crc32_byte_table();

const fn build_crc32_byte_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// A candidate `(len, dist)` pair; `dist` is the 1-based distance back
/// from the current byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub len: u32,
    pub dist: u32,
}

/// Match finder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MfProperties {
    /// Dictionary size in bytes; `1..=2^31`, powers of two preferred.
    pub dict_size: u32,
    /// Stop searching once a candidate of this length is found; `5..=273`.
    pub nice_len: u32,
    /// Maximum hash-chain traversal per position.
    pub depth: u32,
}

/// Hash-chain match finder over a single contiguous input buffer.
pub(crate) struct MatchFinder {
    /// Input region; valid data is `buffer[..buffer.len()]`.
    pub(crate) buffer: Vec<u8>,
    /// Next byte to run through the finder.
    pub(crate) cur: usize,
    /// Bytes scanned (hash-committed) but not yet emitted by the encoder.
    pub(crate) lookahead: u32,
    /// Bias added to `cur` when writing table entries.
    offset: u32,
    pub(crate) nice_len: u32,
    depth: u32,
    max_distance: u32,
    /// 2-, 3- and 4-byte hash heads, concatenated.
    hash: Vec<u32>,
    /// Circular previous-occurrence chain, `max_distance + 1` entries.
    chain: Vec<u32>,
    chaincur: u32,
    hashbits: u32,
    /// Bytes deferred because fewer than four remained; rolled back and
    /// re-hashed once more input arrives.
    unhashedskip: u32,
    /// Set once the caller finished the stream with < 4 bytes left.
    eod: bool,
}

impl MatchFinder {
    pub(crate) fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cur: 0,
            lookahead: 0,
            offset: 0,
            nice_len: 0,
            depth: 0,
            max_distance: 0,
            hash: Vec::new(),
            chain: Vec::new(),
            chaincur: 0,
            hashbits: 0,
            unhashedskip: 0,
            eod: false,
        }
    }

    /// Sizes and clears the tables for `p.dict_size` and rewinds the scan
    /// state. Existing buffered input is discarded.
    pub(crate) fn reset(&mut self, p: &MfProperties) -> Result<()> {
        let dict_size = p.dict_size;
        if dict_size == 0 {
            return Err(Error::InvalidParameter(
                "dictionary size must be non-zero".into(),
            ));
        }

        // Most significant set bit of the dictionary size, minus one for
        // exact powers of two; small dictionaries always get 16 bits.
        let new_hashbits = if dict_size < u32::from(u16::MAX) {
            16
        } else {
            let hs = util::fls(dict_size);
            let exact = 1u32 << (hs - 1) == dict_size;
            (hs - u32::from(exact)).min(31)
        };

        if new_hashbits != self.hashbits || self.max_distance != dict_size - 1 {
            // Build both replacement tables before touching any field, so
            // a failed allocation leaves the old state fully usable.
            let hash = util::try_zeroed_table(HASH4_BASE + (1usize << new_hashbits))?;
            let chain = util::try_zeroed_table(dict_size as usize)?;
            self.hash = hash;
            self.chain = chain;
            self.hashbits = new_hashbits;
        } else {
            self.hash.fill(0);
            self.chain.fill(0);
        }

        self.max_distance = dict_size - 1;
        // Bias table entries past the zero-initialized cells.
        self.offset = self.max_distance + 1;

        self.nice_len = p.nice_len;
        self.depth = p.depth;

        self.cur = 0;
        self.lookahead = 0;
        self.chaincur = 0;
        self.unhashedskip = 0;
        self.eod = false;
        self.buffer.clear();

        debug!(
            "match finder reset: dict_size={dict_size} hashbits={new_hashbits} \
             nice_len={} depth={}",
            p.nice_len, p.depth
        );
        Ok(())
    }

    /// Appends input bytes to the match buffer.
    pub(crate) fn fill(&mut self, src: &[u8]) {
        debug_assert!(self.cur <= self.buffer.len());
        self.buffer.extend_from_slice(src);
    }

    /// Advances the chain cursor and the scan position by one byte.
    fn move_forward(&mut self) {
        if self.chaincur + 1 > self.max_distance {
            self.chaincur = 0;
        } else {
            self.chaincur += 1;
        }
        self.cur += 1;
        debug_assert!(self.cur <= self.buffer.len());
    }

    /// Commits all three hashes plus the chain link for the byte at `cur`.
    fn insert_hashes(&mut self) {
        let cur = self.cur;
        let pos = cur as u32 + self.offset;

        let dualhash =
            CRC32_BYTE_TABLE[self.buffer[cur] as usize] ^ u32::from(self.buffer[cur + 1]);
        let hash2 = (dualhash & (HASH2_SIZE - 1)) as usize;
        self.hash[hash2] = pos;

        let hash3 =
            ((dualhash ^ (u32::from(self.buffer[cur + 2]) << 8)) & (HASH3_SIZE - 1)) as usize;
        self.hash[HASH3_BASE + hash3] = pos;

        let hash4 = (util::load_u32_le(&self.buffer, cur).wrapping_mul(GOLDEN_RATIO_32)
            >> (32 - self.hashbits)) as usize;
        self.chain[self.chaincur as usize] = self.hash[HASH4_BASE + hash4];
        self.hash[HASH4_BASE + hash4] = pos;
    }

    /// Core HC4 search at `cur`: probes the three hash buckets, walks the
    /// chain up to `depth` links and collects candidates in strictly
    /// increasing length order.
    fn do_hc4_find(&mut self, matches: &mut Vec<Match>) {
        let cur = self.cur;
        let pos = cur as u32 + self.offset;
        let ilimit = self.buffer.len().min(cur + self.nice_len as usize);

        let dualhash =
            CRC32_BYTE_TABLE[self.buffer[cur] as usize] ^ u32::from(self.buffer[cur + 1]);
        let hash2 = (dualhash & (HASH2_SIZE - 1)) as usize;
        let delta2 = pos - self.hash[hash2];
        let hash3 =
            ((dualhash ^ (u32::from(self.buffer[cur + 2]) << 8)) & (HASH3_SIZE - 1)) as usize;
        let delta3 = pos - self.hash[HASH3_BASE + hash3];
        let hash4 = (util::load_u32_le(&self.buffer, cur).wrapping_mul(GOLDEN_RATIO_32)
            >> (32 - self.hashbits)) as usize;
        let mut cur_match = self.hash[HASH4_BASE + hash4];

        self.hash[hash2] = pos;
        self.hash[HASH3_BASE + hash3] = pos;
        self.hash[HASH4_BASE + hash4] = pos;
        self.chain[self.chaincur as usize] = cur_match;

        let mut bestlen = 0usize;

        // 2-byte bucket.
        if delta2 <= self.max_distance && self.buffer[cur - delta2 as usize] == self.buffer[cur] {
            let end = util::match_end(&self.buffer, cur + 2, cur + 2 - delta2 as usize, ilimit);
            bestlen = end - cur;
            matches.push(Match {
                len: bestlen as u32,
                dist: delta2,
            });
            if end >= ilimit {
                return;
            }
        }

        // 3-byte bucket, only if it improves on the 2-byte candidate.
        if delta3 != delta2
            && delta3 <= self.max_distance
            && self.buffer[cur - delta3 as usize] == self.buffer[cur]
        {
            let end = util::match_end(&self.buffer, cur + 3, cur + 3 - delta3 as usize, ilimit);
            if end - cur > bestlen {
                bestlen = end - cur;
                matches.push(Match {
                    len: bestlen as u32,
                    dist: delta3,
                });
                if end >= ilimit {
                    return;
                }
            }
        }

        // 4-byte matches along the hash chain.
        for _ in 0..self.depth {
            let delta = pos - cur_match;
            if delta > self.max_distance {
                break;
            }
            let mpos = cur - delta as usize;

            let nextcur = if self.chaincur >= delta {
                self.chaincur - delta
            } else {
                self.max_distance + 1 + self.chaincur - delta
            };
            cur_match = self.chain[nextcur as usize];

            if util::load_u32_le(&self.buffer, mpos) == util::load_u32_le(&self.buffer, cur)
                && self.buffer[mpos + bestlen] == self.buffer[cur + bestlen]
            {
                let end = util::match_end(&self.buffer, cur + 4, mpos + 4, ilimit);
                if end - cur <= bestlen {
                    continue;
                }
                bestlen = end - cur;
                matches.push(Match {
                    len: bestlen as u32,
                    dist: delta,
                });
                if end >= ilimit {
                    break;
                }
            }
        }
    }

    /// One finder step: search (unless at end-of-data), then advance the
    /// cursor and lookahead by one byte.
    fn hc4_find(&mut self, matches: &mut Vec<Match>, finish: bool) -> Result<usize> {
        matches.clear();

        if self.buffer.len() - self.cur < 4 {
            if !finish {
                return Err(Error::NeedInput);
            }
            self.eod = true;
            if self.cur == self.buffer.len() {
                return Err(Error::NeedInput);
            }
        }

        if !self.eod {
            self.do_hc4_find(matches);
        } else {
            // Trailing bytes flush as literals; deferred hashes are moot.
            self.unhashedskip = 0;
        }

        self.move_forward();
        self.lookahead += 1;
        Ok(matches.len())
    }

    /// Produces the candidate list for the current position and advances
    /// by one byte.
    ///
    /// Candidates that already reached `nice_len` (whose search stopped
    /// early) are re-extended against the real end of input, capped at
    /// [`MATCH_LEN_MAX`].
    pub(crate) fn find(&mut self, matches: &mut Vec<Match>, finish: bool) -> Result<usize> {
        if self.unhashedskip > 0 {
            self.skip(0);
        }

        let ip = self.cur;
        let n = self.hc4_find(matches, finish)?;
        if n == 0 {
            return Ok(0);
        }

        let ext_limit = self.buffer.len().min(ip + MATCH_LEN_MAX as usize);
        let mut i = n;
        while i > 0 {
            i -= 1;
            let m = matches[i];
            let start = ip + m.len as usize;
            if m.len < self.nice_len || start >= ext_limit {
                break;
            }
            matches[i].len =
                (util::match_end(&self.buffer, start, start - m.dist as usize, ext_limit) - ip)
                    as u32;
        }
        Ok(n)
    }

    /// Advances `n` bytes, committing hashes as if `find` had been called
    /// but collecting nothing.
    ///
    /// Bytes previously deferred (fewer than four remained) are folded
    /// back in first: the cursor rewinds over them and they are re-hashed,
    /// or re-deferred if input is still short.
    pub(crate) fn skip(&mut self, n: u32) {
        let mut total = n;
        let unhashed = self.unhashedskip;
        if unhashed > 0 {
            total += unhashed;
            self.cur -= unhashed as usize;
            self.unhashedskip = 0;
        }
        if total == 0 {
            return;
        }

        let mut count = 0u32;
        loop {
            if self.buffer.len() - self.cur < 4 {
                let rest = total - count;
                self.unhashedskip = rest;
                self.cur += rest as usize;
                break;
            }

            self.insert_hashes();
            self.move_forward();

            count += 1;
            if count >= total {
                break;
            }
        }

        // Only newly skipped bytes extend the lookahead; re-folded ones
        // were already counted by the skip that deferred them.
        self.lookahead += n;
    }
}
