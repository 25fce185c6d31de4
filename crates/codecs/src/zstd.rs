//! Zstandard codecs built on the streaming API in `zstd::stream::raw`.
//!
//! The encoder closes one frame per block; the decoder reports the end of
//! each frame so concatenated frames decode as members.

use transcode::{Codec, CodecError, Direction, ErrorSlot, Memory, MemoryMut, Processed, Status};
use zstd::stream::raw::{Decoder, Encoder, InBuffer, Operation, OutBuffer};

use crate::level::CompressionLevel;

/// Output space requested per call; the context buffers anything larger.
const MIN_OUTPUT: usize = 64;

/// Compressing codec producing Zstandard frames.
pub struct ZstdCompression {
    level: CompressionLevel,
    encoder: Option<Encoder<'static>>,
}

impl ZstdCompression {
    /// Creates an encoder.
    #[must_use]
    pub const fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            encoder: None,
        }
    }
}

impl Codec for ZstdCompression {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len() / 2 + MIN_OUTPUT
    }

    fn min_out_size(&self, _input: Memory<'_>) -> usize {
        MIN_OUTPUT
    }

    fn initialize(&mut self) -> Result<(), CodecError> {
        self.encoder = Some(Encoder::new(self.level.zstd())?);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        self.encoder = None;
        Ok(())
    }

    fn start(&mut self, _direction: Direction, error: &mut ErrorSlot) -> Status {
        let Some(encoder) = self.encoder.as_mut() else {
            error.set("zstd encoder used before initialization");
            return Status::Error;
        };
        match encoder.reinit() {
            Ok(()) => Status::Ok,
            Err(err) => {
                error.set(err);
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
        let Some(encoder) = self.encoder.as_mut() else {
            error.set("zstd encoder used before initialization");
            return Processed::error();
        };
        let at_end = input.is_empty();
        let mut src = InBuffer::around(input.as_slice());
        let mut dst = OutBuffer::around(output.as_mut_slice());

        if at_end {
            return match encoder.finish(&mut dst, true) {
                Ok(0) => Processed::end(0, dst.pos()),
                Ok(_) => Processed::ok(0, dst.pos()),
                Err(err) => {
                    error.set(err);
                    Processed::error()
                }
            };
        }
        match encoder.run(&mut src, &mut dst) {
            Ok(_) => Processed::ok(src.pos(), dst.pos()),
            Err(err) => {
                error.set(err);
                Processed::error()
            }
        }
    }
}

/// Decompressing codec for Zstandard frames.
pub struct ZstdDecompression {
    decoder: Option<Decoder<'static>>,
    in_frame: bool,
}

impl ZstdDecompression {
    /// Creates a decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoder: None,
            in_frame: false,
        }
    }
}

impl Default for ZstdDecompression {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for ZstdDecompression {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len().saturating_mul(4)
    }

    fn initialize(&mut self) -> Result<(), CodecError> {
        self.decoder = Some(Decoder::new()?);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        self.decoder = None;
        Ok(())
    }

    fn start(&mut self, _direction: Direction, error: &mut ErrorSlot) -> Status {
        let Some(decoder) = self.decoder.as_mut() else {
            error.set("zstd decoder used before initialization");
            return Status::Error;
        };
        self.in_frame = false;
        match decoder.reinit() {
            Ok(()) => Status::Ok,
            Err(err) => {
                error.set(err);
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
        let Some(decoder) = self.decoder.as_mut() else {
            error.set("zstd decoder used before initialization");
            return Processed::error();
        };
        let at_end = input.is_empty();
        let mut src = InBuffer::around(input.as_slice());
        let mut dst = OutBuffer::around(output.as_mut_slice());

        let hint = match decoder.run(&mut src, &mut dst) {
            Ok(hint) => hint,
            Err(err) => {
                error.set(err);
                return Processed::error();
            }
        };
        let (consumed, produced) = (src.pos(), dst.pos());
        if consumed > 0 {
            self.in_frame = true;
        }

        if self.in_frame && hint == 0 {
            self.in_frame = false;
            return Processed::end(consumed, produced);
        }
        if at_end && produced == 0 {
            if self.in_frame {
                error.set("zstd frame is truncated");
                return Processed::error();
            }
            return Processed::end(0, 0);
        }
        Processed::ok(consumed, produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data = b"zstandard payload ".repeat(32);
        let compressed =
            transcode::transcode(ZstdCompression::new(CompressionLevel::Default), &data)
                .expect("compress");
        assert_eq!(&compressed[..4], &[0x28, 0xb5, 0x2f, 0xfd]);
        let decoded = transcode::transcode(ZstdDecompression::new(), &compressed).expect("decompress");
        assert_eq!(decoded, data);
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        let decoded = transcode::transcode(ZstdDecompression::new(), b"").expect("decompress");
        assert!(decoded.is_empty());
    }

    #[test]
    fn truncated_frame_is_a_codec_error() {
        let compressed =
            transcode::transcode(ZstdCompression::new(CompressionLevel::Fast), &[1u8; 4096])
                .expect("compress");
        let err = transcode::transcode(ZstdDecompression::new(), &compressed[..compressed.len() - 2])
            .expect_err("truncated");
        assert!(matches!(err, transcode::Error::Codec(_)));
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let err = transcode::transcode(ZstdDecompression::new(), b"not a zstd frame")
            .expect_err("garbage");
        assert!(matches!(err, transcode::Error::Codec(_)));
    }
}
