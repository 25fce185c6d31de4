//! # Overview
//!
//! Zlib and raw deflate codecs built on [`flate2::Compress`] and
//! [`flate2::Decompress`]. The same types serve both formats; the zlib
//! framing adds a two-byte header and an Adler-32 trailer around the
//! deflate data.
//!
//! # Examples
//!
//! ```
//! use codecs::zlib::{ZlibCompression, ZlibDecompression};
//! use codecs::CompressionLevel;
//!
//! let data = b"highly compressible payload ".repeat(8);
//! let compressed = transcode::transcode(ZlibCompression::new(CompressionLevel::Best), &data)?;
//! let decoded = transcode::transcode(ZlibDecompression::new(), &compressed)?;
//! assert_eq!(decoded, data);
//! # Ok::<(), transcode::Error>(())
//! ```

use flate2::{Compress, Decompress, FlushCompress, FlushDecompress, Status as FlateStatus};
use transcode::{Codec, CodecError, Direction, ErrorSlot, Memory, MemoryMut, Processed, Status};

use crate::level::CompressionLevel;

/// Output space that always fits a deflate block header and the zlib trailer.
const MIN_OUTPUT: usize = 64;

/// Compressing codec producing zlib or raw deflate data.
#[derive(Debug)]
pub struct ZlibCompression {
    level: CompressionLevel,
    zlib_header: bool,
    compressor: Option<Compress>,
}

impl ZlibCompression {
    /// Creates a zlib encoder.
    #[must_use]
    pub const fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            zlib_header: true,
            compressor: None,
        }
    }

    /// Creates an encoder emitting raw deflate data without zlib framing.
    #[must_use]
    pub const fn deflate(level: CompressionLevel) -> Self {
        Self {
            level,
            zlib_header: false,
            compressor: None,
        }
    }

    /// Returns the configured level.
    #[must_use]
    pub const fn level(&self) -> CompressionLevel {
        self.level
    }
}

impl Codec for ZlibCompression {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len() / 2 + MIN_OUTPUT
    }

    fn min_out_size(&self, _input: Memory<'_>) -> usize {
        MIN_OUTPUT
    }

    fn initialize(&mut self) -> Result<(), CodecError> {
        self.compressor = Some(Compress::new(self.level.into(), self.zlib_header));
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        self.compressor = None;
        Ok(())
    }

    fn start(&mut self, _direction: Direction, error: &mut ErrorSlot) -> Status {
        match self.compressor.as_mut() {
            Some(compressor) => {
                compressor.reset();
                Status::Ok
            }
            None => {
                error.set("zlib encoder used before initialization");
                Status::Error
            }
        }
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        let Some(compressor) = self.compressor.as_mut() else {
            error.set("zlib encoder used before initialization");
            return Processed::error();
        };
        let flush = if input.is_empty() {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };

        let before_in = compressor.total_in();
        let before_out = compressor.total_out();
        let status = match compressor.compress(input.as_slice(), output.as_mut_slice(), flush) {
            Ok(status) => status,
            Err(err) => {
                error.set(CodecError::new(err));
                return Processed::error();
            }
        };
        let consumed = (compressor.total_in() - before_in) as usize;
        let produced = (compressor.total_out() - before_out) as usize;

        if status == FlateStatus::StreamEnd {
            Processed::end(consumed, produced)
        } else {
            Processed::ok(consumed, produced)
        }
    }
}

/// Decompressing codec for zlib or raw deflate data.
///
/// Input ending before the end of the compressed stream is reported as a
/// codec error. Bytes after the end are left unconsumed, so a stream with
/// [`concatenated`](transcode::StreamConfig::concatenated) set decodes the
/// next member.
#[derive(Debug)]
pub struct ZlibDecompression {
    zlib_header: bool,
    decompressor: Option<Decompress>,
}

impl ZlibDecompression {
    /// Creates a zlib decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            zlib_header: true,
            decompressor: None,
        }
    }

    /// Creates a decoder for raw deflate data.
    #[must_use]
    pub const fn deflate() -> Self {
        Self {
            zlib_header: false,
            decompressor: None,
        }
    }
}

impl Default for ZlibDecompression {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for ZlibDecompression {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len().saturating_mul(4)
    }

    fn initialize(&mut self) -> Result<(), CodecError> {
        self.decompressor = Some(Decompress::new(self.zlib_header));
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        self.decompressor = None;
        Ok(())
    }

    fn start(&mut self, _direction: Direction, error: &mut ErrorSlot) -> Status {
        match self.decompressor.as_mut() {
            Some(decompressor) => {
                decompressor.reset(self.zlib_header);
                Status::Ok
            }
            None => {
                error.set("zlib decoder used before initialization");
                Status::Error
            }
        }
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        let Some(decompressor) = self.decompressor.as_mut() else {
            error.set("zlib decoder used before initialization");
            return Processed::error();
        };
        let at_end = input.is_empty();
        let flush = if at_end {
            FlushDecompress::Finish
        } else {
            FlushDecompress::None
        };

        let before_in = decompressor.total_in();
        let before_out = decompressor.total_out();
        let status =
            match decompressor.decompress(input.as_slice(), output.as_mut_slice(), flush) {
                Ok(status) => status,
                Err(err) => {
                    error.set(CodecError::new(err));
                    return Processed::error();
                }
            };
        let consumed = (decompressor.total_in() - before_in) as usize;
        let produced = (decompressor.total_out() - before_out) as usize;

        match status {
            FlateStatus::StreamEnd => Processed::end(consumed, produced),
            _ if at_end && produced == 0 => {
                error.set("compressed stream is truncated");
                Processed::error()
            }
            _ => Processed::ok(consumed, produced),
        }
    }
}
