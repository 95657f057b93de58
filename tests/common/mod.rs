//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::io::Read;

use lzma_rawenc::{MfProperties, Properties};

/// Small-dictionary defaults so tests stay light on memory.
pub fn small_props() -> Properties {
    Properties {
        lc: 3,
        lp: 0,
        pb: 2,
        mf: MfProperties {
            dict_size: 1 << 16,
            nice_len: 32,
            depth: 4,
        },
    }
}

/// Decodes a complete `.lzma` stream (13-byte header + payload) with the
/// reference decoder.
pub fn decode(packed: &[u8]) -> Vec<u8> {
    let props_byte = packed[0];
    let dict_size = u32::from_le_bytes(packed[1..5].try_into().unwrap());
    let uncompressed_size = u64::from_le_bytes(packed[5..13].try_into().unwrap());

    let mut reader = lzma_rust2::LzmaReader::new_with_props(
        &packed[13..],
        uncompressed_size,
        props_byte,
        dict_size,
        None,
    )
    .expect("reference decoder rejected the header");

    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .expect("reference decoder rejected the stream");
    out
}
