//! `.lzma` container synthesis and one-shot compression helpers.
//!
//! The encoder core emits only the raw LZMA payload. A classical `.lzma`
//! file prepends a 13-byte header: one properties byte, the dictionary
//! size as 4 little-endian bytes, and the uncompressed length as 8
//! little-endian bytes where all-ones means "unknown, stream ends with
//! the end-of-payload marker". [`compress`] produces exactly that layout;
//! [`compress_raw`] skips the header.
//!
//! Both helpers drive the incremental [`LzmaEncoder`] API, growing the
//! output buffer whenever the encoder suspends with
//! [`Status::OutputFull`].

use crate::encoder::{LzmaEncoder, Properties, Status};
use crate::error::Result;

/// Header size-field value for a stream of unknown length.
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// Appends the 13-byte `.lzma` header for `props` to `out`.
///
/// `uncompressed_size` of `None` writes the unknown-length marker; such
/// streams must be terminated by the end-of-payload marker, which
/// [`LzmaEncoder::encode`] emits on finish.
pub fn write_header(out: &mut Vec<u8>, props: &Properties, uncompressed_size: Option<u64>) {
    out.push(props.props_byte());
    out.extend_from_slice(&props.mf.dict_size.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.unwrap_or(UNKNOWN_SIZE).to_le_bytes());
}

/// Compresses `data` into a raw LZMA payload (no container header).
pub fn compress_raw(data: &[u8], props: &Properties) -> Result<Vec<u8>> {
    let mut enc = LzmaEncoder::new(props)?;
    enc.fill(data);

    let mut out = vec![0u8; (data.len() / 2).max(64)];
    let mut written = 0usize;
    loop {
        let (n, status) = enc.encode(&mut out[written..], true);
        written += n;
        match status {
            Status::Finished => break,
            Status::OutputFull => {
                let grown = out.len() * 2;
                out.resize(grown, 0);
            }
            Status::NeedInput => unreachable!("finish consumes all buffered input"),
        }
    }
    out.truncate(written);
    Ok(out)
}

/// Compresses `data` into a complete `.lzma` stream (header + payload).
pub fn compress(data: &[u8], props: &Properties) -> Result<Vec<u8>> {
    let payload = compress_raw(data, props)?;
    let mut out = Vec::with_capacity(13 + payload.len());
    write_header(&mut out, props, None);
    out.extend_from_slice(&payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_props() -> Properties {
        let mut props = Properties::default();
        props.mf.dict_size = 1 << 16;
        props
    }

    #[test]
    fn test_header_layout() {
        let mut out = Vec::new();
        write_header(&mut out, &small_props(), None);
        assert_eq!(out.len(), 13);
        assert_eq!(out[0], 0x5D);
        assert_eq!(&out[1..5], &(1u32 << 16).to_le_bytes());
        assert_eq!(&out[5..13], &[0xFF; 8]);
    }

    #[test]
    fn test_header_known_size() {
        let mut out = Vec::new();
        write_header(&mut out, &small_props(), Some(42));
        assert_eq!(&out[5..13], &42u64.to_le_bytes());
    }

    #[test]
    fn test_empty_input_still_terminates() {
        let raw = compress_raw(b"", &small_props()).unwrap();
        // End marker plus range coder flush, nothing else.
        assert!(!raw.is_empty());
        assert!(raw.len() <= 16);

        let framed = compress(b"", &small_props()).unwrap();
        assert_eq!(framed.len(), 13 + raw.len());
    }

    #[test]
    fn test_compress_is_header_plus_raw() {
        let data = b"squeeze squeeze squeeze";
        let raw = compress_raw(data, &small_props()).unwrap();
        let framed = compress(data, &small_props()).unwrap();
        assert_eq!(&framed[13..], &raw[..]);
        assert_eq!(framed[0], 0x5D);
    }

    #[test]
    fn test_long_run_compresses_tightly() {
        let data = vec![b'x'; 1024];
        let raw = compress_raw(&data, &small_props()).unwrap();
        assert!(raw.len() < 64, "1 KiB run stayed {} bytes", raw.len());
    }
}
