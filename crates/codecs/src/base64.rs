//! Standard base64 (RFC 4648, padded) encoder and decoder.
//!
//! Both codecs work on whole quanta: three bytes of data map to four
//! symbols. Partial quanta are held back until more input arrives or the
//! data ends.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use transcode::{Codec, CodecError, Direction, ErrorSlot, Memory, MemoryMut, Processed, Status};

/// Encodes bytes as padded standard base64.
#[derive(Clone, Debug, Default)]
pub struct Base64Encoder {
    pending: Vec<u8>,
}

impl Base64Encoder {
    /// Creates an encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl Codec for Base64Encoder {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len().div_ceil(3) * 4
    }

    fn min_out_size(&self, _input: Memory<'_>) -> usize {
        4
    }

    fn start(&mut self, _direction: Direction, _error: &mut ErrorSlot) -> Status {
        self.pending.clear();
        Status::Ok
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        let out = output.as_mut_slice();
        if input.is_empty() {
            if self.pending.is_empty() {
                return Processed::end(0, 0);
            }
            return match STANDARD.encode_slice(&self.pending, out) {
                Ok(produced) => {
                    self.pending.clear();
                    Processed::end(0, produced)
                }
                Err(err) => fail(error, CodecError::new(err)),
            };
        }

        let (mut consumed, mut produced) = (0, 0);
        if !self.pending.is_empty() {
            let take = (3 - self.pending.len()).min(input.len());
            self.pending.extend_from_slice(&input[..take]);
            consumed = take;
            if self.pending.len() < 3 {
                return Processed::ok(consumed, 0);
            }
            match STANDARD.encode_slice(&self.pending, out) {
                Ok(n) => produced = n,
                Err(err) => return fail(error, CodecError::new(err)),
            }
            self.pending.clear();
        }

        let rest = &input[consumed..];
        let room = (out.len() - produced) / 4 * 3;
        let whole = (rest.len() / 3 * 3).min(room);
        if whole > 0 {
            match STANDARD.encode_slice(&rest[..whole], &mut out[produced..]) {
                Ok(n) => produced += n,
                Err(err) => return fail(error, CodecError::new(err)),
            }
            consumed += whole;
        }

        let tail = &input[consumed..];
        if tail.len() < 3 {
            self.pending.extend_from_slice(tail);
            consumed += tail.len();
        }
        Processed::ok(consumed, produced)
    }
}

/// Decodes padded standard base64, skipping ASCII whitespace.
///
/// Symbols outside the alphabet, misplaced padding and data ending inside
/// a quantum are reported as codec errors.
#[derive(Clone, Debug, Default)]
pub struct Base64Decoder {
    quantum: [u8; 4],
    filled: usize,
}

impl Base64Decoder {
    /// Creates a decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            quantum: [0; 4],
            filled: 0,
        }
    }
}

impl Codec for Base64Decoder {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len() / 4 * 3
    }

    fn min_out_size(&self, _input: Memory<'_>) -> usize {
        3
    }

    fn start(&mut self, _direction: Direction, _error: &mut ErrorSlot) -> Status {
        self.filled = 0;
        Status::Ok
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        if input.is_empty() {
            if self.filled == 0 {
                return Processed::end(0, 0);
            }
            return fail(
                error,
                CodecError::msg(format!(
                    "base64 data ends {} symbols into a quantum",
                    self.filled
                )),
            );
        }

        let out = output.as_mut_slice();
        let (mut consumed, mut produced) = (0, 0);
        for &symbol in input.iter() {
            if self.filled == 3 && out.len() - produced < 3 {
                break;
            }
            consumed += 1;
            if symbol.is_ascii_whitespace() {
                continue;
            }
            self.quantum[self.filled] = symbol;
            self.filled += 1;
            if self.filled == 4 {
                match STANDARD.decode_slice(self.quantum, &mut out[produced..]) {
                    Ok(n) => produced += n,
                    Err(err) => return fail(error, CodecError::new(err)),
                }
                self.filled = 0;
            }
        }
        Processed::ok(consumed, produced)
    }
}

fn fail(error: &mut ErrorSlot, cause: CodecError) -> Processed {
    error.set(cause);
    Processed::error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step<C: Codec>(codec: &mut C, input: &[u8], out: &mut [u8]) -> Processed {
        let mut slot = ErrorSlot::new();
        codec.process(Memory::new(input), MemoryMut::new(out), &mut slot)
    }

    #[test]
    fn encodes_known_vectors() {
        let vectors: [(&[u8], &str); 7] = [
            (b"", ""),
            (b"f", "Zg=="),
            (b"fo", "Zm8="),
            (b"foo", "Zm9v"),
            (b"foob", "Zm9vYg=="),
            (b"fooba", "Zm9vYmE="),
            (b"foobar", "Zm9vYmFy"),
        ];
        for (plain, encoded) in vectors {
            let out = transcode::transcode(Base64Encoder::new(), plain).expect("encode");
            assert_eq!(out, encoded.as_bytes());
        }
    }

    #[test]
    fn encoder_holds_partial_quanta() {
        let mut codec = Base64Encoder::new();
        let mut out = [0u8; 16];
        assert_eq!(step(&mut codec, b"fo", &mut out), Processed::ok(2, 0));
        assert_eq!(step(&mut codec, b"ob", &mut out), Processed::ok(2, 4));
        assert_eq!(&out[..4], b"Zm9v");
        assert_eq!(step(&mut codec, b"", &mut out), Processed::end(0, 4));
        assert_eq!(&out[..4], b"Yg==");
    }

    #[test]
    fn encoder_respects_output_room() {
        let mut codec = Base64Encoder::new();
        let mut out = [0u8; 4];
        assert_eq!(step(&mut codec, b"foobar", &mut out), Processed::ok(3, 4));
        assert_eq!(&out, b"Zm9v");
    }

    #[test]
    fn decoder_skips_whitespace() {
        let out = transcode::transcode(Base64Decoder::new(), b"Zm9v\nYmFy\r\n  Zg==\n")
            .expect("decode");
        assert_eq!(out, b"foobarf");
    }

    #[test]
    fn decoder_waits_for_output_room() {
        let mut codec = Base64Decoder::new();
        let mut out = [0u8; 3];
        assert_eq!(step(&mut codec, b"Zm9vYmFy", &mut out), Processed::ok(7, 3));
        assert_eq!(&out, b"foo");
    }

    #[test]
    fn decoder_rejects_invalid_symbols() {
        let err = transcode::transcode(Base64Decoder::new(), b"Zm9v!!!!").expect_err("invalid");
        let cause = err.codec_error().expect("codec error");
        assert!(cause.downcast_ref::<::base64::DecodeSliceError>().is_some());
    }

    #[test]
    fn decoder_rejects_truncated_quanta() {
        let err = transcode::transcode(Base64Decoder::new(), b"Zm9vYm").expect_err("truncated");
        assert_eq!(
            err.codec_error().map(ToString::to_string).as_deref(),
            Some("base64 data ends 2 symbols into a quantum")
        );
    }
}
