//! Compression levels shared by the zlib, deflate and zstd encoders.

use std::num::NonZeroU8;

use flate2::Compression;

/// Compression level requested from an encoder.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum CompressionLevel {
    /// Favour speed over compression ratio.
    Fast,
    /// Use the library's default balance between speed and ratio.
    #[default]
    Default,
    /// Favour the best possible compression ratio.
    Best,
    /// Use an explicit level in the range `1..=9`.
    Precise(NonZeroU8),
}

impl CompressionLevel {
    /// Creates a [`CompressionLevel::Precise`] value from an explicit numeric level.
    ///
    /// The caller is responsible for interpreting `0` as disabled compression.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionLevelError`] when `level` is outside `1..=9`.
    pub fn from_numeric(level: u32) -> Result<Self, CompressionLevelError> {
        u8::try_from(level)
            .ok()
            .filter(|value| (1..=9).contains(value))
            .and_then(NonZeroU8::new)
            .map(Self::Precise)
            .ok_or(CompressionLevelError { level })
    }

    /// Constructs a [`CompressionLevel::Precise`] variant from the provided level.
    #[must_use]
    pub const fn precise(level: NonZeroU8) -> Self {
        Self::Precise(level)
    }

    /// Returns the equivalent zstd level.
    #[must_use]
    pub const fn zstd(self) -> i32 {
        match self {
            Self::Fast => 1,
            Self::Default => 3,
            Self::Best => 19,
            Self::Precise(value) => value.get() as i32,
        }
    }
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Fast => Self::fast(),
            CompressionLevel::Default => Self::default(),
            CompressionLevel::Best => Self::best(),
            CompressionLevel::Precise(value) => Self::new(u32::from(value.get())),
        }
    }
}

/// Error returned when a requested compression level falls outside `1..=9`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("compression level {level} is outside the supported range 1-9")]
pub struct CompressionLevelError {
    level: u32,
}

impl CompressionLevelError {
    /// Returns the invalid compression level that triggered the error.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }
}
