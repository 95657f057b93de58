//! Property-based tests using proptest.
//!
//! These verify the encoder's cross-cutting invariants over randomly
//! generated inputs: every valid parameter set round-trips through the
//! reference decoder, and output chunking never changes the emitted
//! bytes.

mod common;

use common::decode;
use lzma_rawenc::{LzmaEncoder, MfProperties, Properties, Status, stream};
use proptest::prelude::*;

/// A spread of valid `lc/lp/pb` and match-finder settings; dictionaries
/// stay small so the tables are cheap to build per case.
fn props_strategy() -> impl Strategy<Value = Properties> {
    (
        prop_oneof![
            Just((3u32, 0u32, 2u32)),
            Just((0, 0, 0)),
            Just((1, 1, 1)),
            Just((2, 2, 4)),
            Just((4, 0, 3)),
        ],
        prop_oneof![Just(1u32 << 12), Just(1 << 16)],
        prop_oneof![Just(8u32), Just(32), Just(64)],
        1u32..=16,
    )
        .prop_map(|((lc, lp, pb), dict_size, nice_len, depth)| Properties {
            lc,
            lp,
            pb,
            mf: MfProperties {
                dict_size,
                nice_len,
                depth,
            },
        })
}

/// Inputs skewed toward matchable content: pure noise compresses to
/// nothing interesting, so mix in low-alphabet data and repeated blocks.
fn data_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..512),
        proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c')], 0..2048),
        (proptest::collection::vec(any::<u8>(), 1..64), 1usize..32)
            .prop_map(|(block, times)| block.repeat(times)),
    ]
}

fn encode_chunked(data: &[u8], props: &Properties, chunks: &[usize]) -> Vec<u8> {
    let mut enc = LzmaEncoder::new(props).unwrap();
    enc.fill(data);
    let mut collected = Vec::new();
    let mut idx = 0usize;
    loop {
        let size = chunks[idx % chunks.len()];
        idx += 1;
        let mut out = vec![0u8; size];
        let (n, status) = enc.encode(&mut out, true);
        collected.extend_from_slice(&out[..n]);
        match status {
            Status::Finished => return collected,
            Status::OutputFull => continue,
            Status::NeedInput => unreachable!("finish never needs input"),
        }
    }
}

proptest! {
    /// Anything we compress, the reference decoder must reproduce.
    #[test]
    fn roundtrip_decodes_to_input(
        data in data_strategy(),
        props in props_strategy(),
    ) {
        let packed = stream::compress(&data, &props).unwrap();
        prop_assert_eq!(decode(&packed), data);
    }

    /// Splitting the output across arbitrarily sized buffers yields the
    /// same byte stream as a single large buffer.
    #[test]
    fn output_chunking_is_transparent(
        data in data_strategy(),
        chunks in proptest::collection::vec(1usize..48, 1..8),
    ) {
        let props = Properties {
            lc: 3,
            lp: 0,
            pb: 2,
            mf: MfProperties { dict_size: 1 << 14, nice_len: 32, depth: 4 },
        };
        let reference = stream::compress_raw(&data, &props).unwrap();
        let chunked = encode_chunked(&data, &props, &chunks);
        prop_assert_eq!(chunked, reference);
    }

    /// Feeding the input in pieces (draining between fills) still decodes
    /// to the original bytes.
    #[test]
    fn incremental_fill_roundtrips(
        data in data_strategy(),
        piece in 1usize..96,
    ) {
        let props = Properties {
            lc: 3,
            lp: 0,
            pb: 2,
            mf: MfProperties { dict_size: 1 << 14, nice_len: 32, depth: 4 },
        };
        let mut enc = LzmaEncoder::new(&props).unwrap();
        let mut payload = Vec::new();
        let mut buf = vec![0u8; data.len() * 2 + 64];

        for chunk in data.chunks(piece) {
            enc.fill(chunk);
            let (n, status) = enc.encode(&mut buf, false);
            payload.extend_from_slice(&buf[..n]);
            prop_assert_eq!(status, Status::NeedInput);
        }
        loop {
            let (n, status) = enc.encode(&mut buf, true);
            payload.extend_from_slice(&buf[..n]);
            match status {
                Status::Finished => break,
                Status::OutputFull => continue,
                Status::NeedInput => return Err(TestCaseError::fail("finish needed input")),
            }
        }

        let mut packed = Vec::new();
        stream::write_header(&mut packed, &props, None);
        packed.extend_from_slice(&payload);
        prop_assert_eq!(decode(&packed), data);
    }
}
