//! Error types for the LZMA encoder.
//!
//! This module provides the [`Error`] enum covering every failure mode of the
//! encoder, along with a convenient [`Result<T>`] type alias.
//!
//! Two of the variants are *recoverable flow-control conditions* rather than
//! hard failures:
//!
//! - [`Error::OutputFull`] — the caller-provided output buffer ran out of
//!   room. All encoder state (including the range coder's pending symbol
//!   queue) is preserved; call [`LzmaEncoder::encode`] again with more room.
//! - [`Error::NeedInput`] — fewer than four bytes of input remain and the
//!   stream was not finished. Append more data with [`LzmaEncoder::fill`]
//!   and retry, or pass `finish = true` to terminate the stream.
//!
//! The public driver translates these two conditions into
//! [`Status`](crate::Status) values; they only appear as `Err` on the
//! crate-internal layers.
//!
//! [`LzmaEncoder::encode`]: crate::LzmaEncoder::encode
//! [`LzmaEncoder::fill`]: crate::LzmaEncoder::fill

/// Errors produced by the LZMA encoder.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An encoder parameter is outside its accepted range.
    ///
    /// Reported by [`LzmaEncoder::reset`](crate::LzmaEncoder::reset) (and
    /// `new`) before any state is touched. Typical causes: a zero dictionary
    /// size, `lc + lp > 4`, or `nice_len` outside `5..=273`.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A hash, chain or literal-probability table could not be allocated.
    #[error("out of memory allocating encoder tables")]
    OutOfMemory,

    /// The output buffer is full.
    ///
    /// Recoverable: the range coder keeps its pending symbols and resumes
    /// exactly where it stopped once the caller provides more output room.
    #[error("output buffer full")]
    OutputFull,

    /// Not enough input is buffered to continue matching.
    ///
    /// Recoverable: raised when fewer than four bytes remain and the stream
    /// was not marked finished.
    #[error("need more input")]
    NeedInput,
}

/// A specialized [`Result`](std::result::Result) type for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;
