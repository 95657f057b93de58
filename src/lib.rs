//! # lzma-rawenc
//!
//! A pure-Rust LZMA1 stream encoder.
//!
//! This crate implements the compressor core of the classical `.lzma`
//! (LZMA1) format: a hash-chain match finder, a greedy parser with one
//! byte of lookahead, and a range coder over adaptive 11-bit probability
//! models. It encodes only; pair it with any LZMA decoder.
//!
//! ## Quick start
//!
//! One-shot compression into a complete `.lzma` stream:
//!
//! ```
//! use lzma_rawenc::{Properties, stream};
//!
//! let props = Properties::for_level(1);
//! let packed = stream::compress(b"an example payload", &props)?;
//! assert_eq!(packed[0], 0x5D); // default lc=3, lp=0, pb=2
//! # Ok::<(), lzma_rawenc::Error>(())
//! ```
//!
//! ## Incremental encoding
//!
//! The [`LzmaEncoder`] API separates input buffering from output
//! draining, so both sides can be sized by the caller:
//!
//! ```
//! use lzma_rawenc::{LzmaEncoder, Properties, Status};
//!
//! let mut enc = LzmaEncoder::new(&Properties::for_level(0))?;
//! enc.fill(b"hello hello hello");
//! let mut out = vec![0u8; 256];
//! let (n, status) = enc.encode(&mut out, true);
//! assert_eq!(status, Status::Finished);
//! assert!(n > 0);
//! # Ok::<(), lzma_rawenc::Error>(())
//! ```
//!
//! `encode` never loses state: [`Status::OutputFull`] means "call again
//! with more room", [`Status::NeedInput`] means "feed more data or pass
//! `finish = true`".
//!
//! ## Scope
//!
//! - LZMA1 payloads and the 13-byte `.lzma` header only; no LZMA2/XZ
//!   framing.
//! - Single contiguous input buffer; no dictionary wrap-around.
//! - The fast greedy parser only; no price-based optimal parse.
//! - No decoder.

pub mod error;
pub mod stream;

mod encoder;
mod mf;
mod model;
mod rc;
mod util;

pub use encoder::{DICT_SIZE_MAX, LzmaEncoder, Properties, Status};
pub use error::{Error, Result};
pub use mf::MfProperties;
