#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `codecs` provides compression and text-encoding codecs that plug into
//! [`transcode::TranscodingStream`]: zlib, raw deflate, Zstandard and
//! base64. Each codec comes as an encoder and a decoder implementing
//! [`transcode::Codec`].
//!
//! # Design
//!
//! The [`zlib`] module wraps [`flate2::Compress`] and
//! [`flate2::Decompress`], the `zstd` module wraps the streaming contexts of
//! `zstd::stream::raw` and the [`base64`](crate::base64) module uses the
//! `base64` engine on whole quanta. [`CompressionAlgorithm`] names each family and builds boxed
//! codecs at runtime.
//!
//! # Invariants
//!
//! - Codecs never allocate output buffers; the stream provides them.
//! - Decoders stop at the end of a member (zlib stream or zstd frame) and
//!   leave the following bytes unconsumed.
//! - Corrupt or truncated input is reported through the error slot, never
//!   silently ignored.
//!
//! # Errors
//!
//! The helpers return [`transcode::Error`]. Failures inside a codec arrive
//! as [`transcode::Error::Codec`] and carry the library error, which
//! [`transcode::CodecError::downcast_ref`] recovers.
//!
//! # Examples
//!
//! Compressing through a writer and decompressing through a reader:
//!
//! ```
//! use std::io::{Read, Write};
//!
//! use codecs::CompressionLevel;
//! use codecs::zlib::{ZlibCompression, ZlibDecompression};
//! use transcode::TranscodingStream;
//!
//! let mut writer = TranscodingStream::new(ZlibCompression::new(CompressionLevel::Best), Vec::new())?;
//! writer.write_all(b"streaming example payload")?;
//! writer.finish()?;
//! let compressed = writer.into_inner();
//!
//! let mut reader = TranscodingStream::new(ZlibDecompression::new(), &compressed[..])?;
//! let mut decoded = String::new();
//! reader.read_to_string(&mut decoded)?;
//! assert_eq!(decoded, "streaming example payload");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithm;
pub mod base64;
mod level;
pub mod zlib;
#[cfg(feature = "zstd")]
pub mod zstd;

pub use algorithm::{BoxedCodec, CompressionAlgorithm, CompressionAlgorithmParseError};
pub use level::{CompressionLevel, CompressionLevelError};

/// Encodes `input` with `algorithm` into a new [`Vec`].
///
/// # Errors
///
/// Returns the codec failure, if any.
pub fn compress_to_vec(
    input: &[u8],
    algorithm: CompressionAlgorithm,
    level: CompressionLevel,
) -> Result<Vec<u8>, transcode::Error> {
    transcode::transcode(algorithm.encoder(level), input)
}

/// Decodes `input` with `algorithm` into a new [`Vec`].
///
/// # Errors
///
/// Returns [`transcode::Error::Codec`] for corrupt or truncated input.
pub fn decompress_to_vec(
    input: &[u8],
    algorithm: CompressionAlgorithm,
) -> Result<Vec<u8>, transcode::Error> {
    transcode::transcode(algorithm.decoder(), input)
}
