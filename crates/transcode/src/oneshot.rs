//! Transcoding whole byte slices in memory.

use std::fmt;

use crate::buffer::Buffer;
use crate::codec::{Codec, CodecHandle, Direction, Status};
use crate::error::{CodecError, Error, ErrorSlot};
use crate::memory::Memory;
use crate::progress::{Backoff, checked};
use crate::state::Mode;
use crate::trace;

/// Transcodes `data` in one call.
///
/// The codec is initialized, run over `data` and finalized.
///
/// ```
/// let copy = transcode::transcode(transcode::Noop, b"hello")?;
/// assert_eq!(copy, b"hello");
/// # Ok::<(), transcode::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::Initialize`], [`Error::Codec`] or [`Error::Finalize`]
/// when the codec fails at the matching stage.
pub fn transcode<C: Codec>(codec: C, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut transcoder = Transcoder::new(codec)?;
    let output = transcoder.transcode(data)?;
    transcoder.finish()?;
    Ok(output)
}

/// Codec kept initialized across several one-shot transcodes.
///
/// Each call to [`Transcoder::transcode`] restarts the codec in write
/// direction and runs it to the end of a block. A codec failure poisons the
/// transcoder. The codec is finalized by [`Transcoder::finish`] or on drop.
pub struct Transcoder<C: Codec> {
    codec: CodecHandle<C>,
    error: ErrorSlot,
}

impl<C: Codec> Transcoder<C> {
    /// Initializes `codec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Initialize`] when the codec refuses to initialize.
    pub fn new(codec: C) -> Result<Self, Error> {
        let codec = CodecHandle::initialize(codec).map_err(Error::Initialize)?;
        Ok(Self {
            codec,
            error: ErrorSlot::new(),
        })
    }

    /// Returns the codec.
    #[must_use]
    pub const fn codec(&self) -> &C {
        self.codec.get()
    }

    /// Returns the failure that poisoned the transcoder, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CodecError> {
        self.error.get()
    }

    /// Transcodes `data` into a new vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] when the codec fails, [`Error::Broken`] once
    /// an earlier call failed, and [`Error::Stalled`] when the codec stops
    /// making progress.
    pub fn transcode(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        if let Some(error) = self.error.get() {
            return Err(Error::Broken(error.clone()));
        }
        if self.codec.is_finalized() {
            return Err(Error::Protocol {
                operation: "transcode with",
                mode: Mode::Closed,
            });
        }
        if self.codec.get().is_passthrough() {
            return Ok(data.to_vec());
        }

        let expected = self.codec.get().expected_size(Memory::new(data));
        let mut output = Buffer::with_capacity(expected.max(1));
        self.start()?;

        let mut consumed = 0;
        let mut backoff = Backoff::default();
        loop {
            let input = Memory::new(&data[consumed..]);
            output.make_room(
                self.codec
                    .get()
                    .min_out_size(input)
                    .saturating_add(backoff.margin),
            );
            let (input_len, output_len) = (input.len(), output.free());
            let step = self
                .codec
                .get_mut()
                .process(input, output.writable(), &mut self.error);
            let step = checked(step, input_len, output_len, &mut self.error);
            trace::process(Direction::Write, input_len, &step);

            consumed += step.consumed;
            output.supply(step.produced);
            match step.status {
                Status::Error => return Err(self.poison()),
                Status::End if consumed == data.len() => break,
                Status::End => {
                    trace::restart(Direction::Write);
                    self.start()?;
                    backoff.progressed();
                }
                Status::Ok if step.is_idle() => backoff.stalled(Mode::Writing)?,
                Status::Ok => backoff.progressed(),
            }
        }
        Ok(output.into_vec())
    }

    /// Finalizes the codec, reporting a failure the drop path would only log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Finalize`] when the codec fails to finalize.
    pub fn finish(mut self) -> Result<(), Error> {
        self.codec.finalize().map_err(Error::Finalize)
    }

    fn start(&mut self) -> Result<(), Error> {
        match self.codec.get_mut().start(Direction::Write, &mut self.error) {
            Status::Error => Err(self.poison()),
            Status::Ok | Status::End => Ok(()),
        }
    }

    fn poison(&mut self) -> Error {
        let error = self.error.get_or_insert_unknown();
        if let Err(finalize) = self.codec.finalize() {
            trace::finalize_failed("transcoder", &finalize);
        }
        Error::Codec(error)
    }
}

impl<C: Codec> fmt::Debug for Transcoder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcoder")
            .field("finalized", &self.codec.is_finalized())
            .field("error", &self.error.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Processed;
    use crate::memory::MemoryMut;
    use crate::noop::Noop;

    /// Reverses each block it sees, emitting it on end of input.
    #[derive(Default)]
    struct Reverse {
        held: Vec<u8>,
        starts: usize,
    }

    impl Codec for Reverse {
        fn start(&mut self, _direction: Direction, _error: &mut ErrorSlot) -> Status {
            self.starts += 1;
            self.held.clear();
            Status::Ok
        }

        fn process(
            &mut self,
            input: Memory<'_>,
            mut output: MemoryMut<'_>,
            _error: &mut ErrorSlot,
        ) -> Processed {
            if !input.is_empty() {
                self.held.extend_from_slice(&input);
                return Processed::ok(input.len(), 0);
            }
            let n = self.held.len().min(output.len());
            for (slot, byte) in output[..n].iter_mut().zip(self.held.iter().rev()) {
                *slot = *byte;
            }
            self.held.truncate(self.held.len() - n);
            if self.held.is_empty() {
                Processed::end(0, n)
            } else {
                Processed::ok(0, n)
            }
        }
    }

    struct Rejecting;

    impl Codec for Rejecting {
        fn process(
            &mut self,
            _input: Memory<'_>,
            _output: MemoryMut<'_>,
            error: &mut ErrorSlot,
        ) -> Processed {
            error.set("rejected");
            Processed::error()
        }
    }

    #[test]
    fn noop_is_a_copy() {
        assert_eq!(transcode(Noop, b"same").expect("copy"), b"same");
    }

    #[test]
    fn transcoder_restarts_per_call() {
        let mut transcoder = Transcoder::new(Reverse::default()).expect("transcoder");
        assert_eq!(transcoder.transcode(b"abc").expect("first"), b"cba");
        assert_eq!(transcoder.transcode(b"xy").expect("second"), b"yx");
        assert_eq!(transcoder.codec().starts, 2);
        transcoder.finish().expect("finish");
    }

    #[test]
    fn empty_input_is_transcoded() {
        assert!(transcode(Reverse::default(), b"").expect("empty").is_empty());
    }

    #[test]
    fn failure_poisons_the_transcoder() {
        let mut transcoder = Transcoder::new(Rejecting).expect("transcoder");
        let err = transcoder.transcode(b"data").expect_err("rejected");
        assert!(matches!(err, Error::Codec(_)));
        let err = transcoder.transcode(b"data").expect_err("poisoned");
        assert!(matches!(err, Error::Broken(_)));
        assert_eq!(transcoder.error().map(ToString::to_string).as_deref(), Some("rejected"));
    }
}
