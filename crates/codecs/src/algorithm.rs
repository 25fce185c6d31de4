//! Enumeration of the codecs this crate provides, with factories.

use core::fmt;
use core::str::FromStr;

use transcode::Codec;

use crate::base64::{Base64Decoder, Base64Encoder};
use crate::level::CompressionLevel;
use crate::zlib::{ZlibCompression, ZlibDecompression};
#[cfg(feature = "zstd")]
use crate::zstd::{ZstdCompression, ZstdDecompression};

/// Boxed codec returned by the factories.
pub type BoxedCodec = Box<dyn Codec + Send>;

/// Codec families recognised by the crate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum CompressionAlgorithm {
    /// Deflate data inside zlib framing.
    #[default]
    Zlib,
    /// Raw deflate data without framing.
    Deflate,
    /// Zstandard frames.
    #[cfg(feature = "zstd")]
    Zstd,
    /// Padded standard base64 text.
    Base64,
}

impl CompressionAlgorithm {
    /// Returns the canonical name used in diagnostics and parsing.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zlib => "zlib",
            Self::Deflate => "deflate",
            #[cfg(feature = "zstd")]
            Self::Zstd => "zstd",
            Self::Base64 => "base64",
        }
    }

    /// Returns the set of algorithms available in the current build.
    #[must_use]
    pub fn available() -> &'static [Self] {
        #[cfg(feature = "zstd")]
        {
            const ALGORITHMS: &[CompressionAlgorithm] = &[
                CompressionAlgorithm::Zlib,
                CompressionAlgorithm::Deflate,
                CompressionAlgorithm::Zstd,
                CompressionAlgorithm::Base64,
            ];
            ALGORITHMS
        }

        #[cfg(not(feature = "zstd"))]
        {
            const ALGORITHMS: &[CompressionAlgorithm] = &[
                CompressionAlgorithm::Zlib,
                CompressionAlgorithm::Deflate,
                CompressionAlgorithm::Base64,
            ];
            ALGORITHMS
        }
    }

    /// Builds an encoder. `level` is ignored by base64.
    #[must_use]
    pub fn encoder(self, level: CompressionLevel) -> BoxedCodec {
        match self {
            Self::Zlib => Box::new(ZlibCompression::new(level)),
            Self::Deflate => Box::new(ZlibCompression::deflate(level)),
            #[cfg(feature = "zstd")]
            Self::Zstd => Box::new(ZstdCompression::new(level)),
            Self::Base64 => Box::new(Base64Encoder::new()),
        }
    }

    /// Builds the matching decoder.
    #[must_use]
    pub fn decoder(self) -> BoxedCodec {
        match self {
            Self::Zlib => Box::new(ZlibDecompression::new()),
            Self::Deflate => Box::new(ZlibDecompression::deflate()),
            #[cfg(feature = "zstd")]
            Self::Zstd => Box::new(ZstdDecompression::new()),
            Self::Base64 => Box::new(Base64Decoder::new()),
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unsupported algorithm name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unsupported codec: {input}")]
pub struct CompressionAlgorithmParseError {
    input: String,
}

impl CompressionAlgorithmParseError {
    /// Returns the invalid input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = CompressionAlgorithmParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zlib" | "zlibx" => Ok(Self::Zlib),
            "deflate" | "raw" => Ok(Self::Deflate),
            #[cfg(feature = "zstd")]
            "zstd" => Ok(Self::Zstd),
            "base64" | "b64" => Ok(Self::Base64),
            other => Err(CompressionAlgorithmParseError {
                input: other.to_owned(),
            }),
        }
    }
}
