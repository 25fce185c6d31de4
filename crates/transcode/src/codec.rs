//! The protocol every pluggable transform implements.
//!
//! # Overview
//!
//! A codec sees the stream only through [`Memory`] views and byte counts. The
//! engine owns cursor bookkeeping and buffer growth; the codec reports how
//! many bytes it consumed and produced on each [`Codec::process`] call.
//!
//! # Call order
//!
//! 1. [`Codec::initialize`] exactly once. If it fails no other method runs,
//!    not even [`Codec::finalize`].
//! 2. [`Codec::start`] once per direction activation, again after a
//!    completed block or member when the stream restarts the codec.
//! 3. [`Codec::process`] repeatedly. An empty input announces the end of
//!    the data; the codec flushes and eventually answers [`Status::End`].
//! 4. [`Codec::finalize`] exactly once, on close or right after `start` or
//!    `process` returned [`Status::Error`].

use std::fmt;

use crate::error::{CodecError, ErrorSlot};
use crate::memory::{Memory, MemoryMut};

/// Direction a codec is started in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// Data flows from the resource to the consumer.
    Read,
    /// Data flows from the consumer to the resource.
    Write,
}

impl Direction {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status code returned by [`Codec::start`] and [`Codec::process`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Status {
    /// The call succeeded and the codec expects further calls.
    #[default]
    Ok,
    /// The codec emitted everything for the current block or member.
    End,
    /// The codec failed and stored the cause in the error slot.
    Error,
}

/// Outcome of one [`Codec::process`] call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Processed {
    /// Bytes read from the input view.
    pub consumed: usize,
    /// Bytes written to the output view.
    pub produced: usize,
    /// Status of the call.
    pub status: Status,
}

impl Processed {
    /// Creates an outcome from its parts.
    #[must_use]
    pub const fn new(consumed: usize, produced: usize, status: Status) -> Self {
        Self {
            consumed,
            produced,
            status,
        }
    }

    /// A successful step.
    #[must_use]
    pub const fn ok(consumed: usize, produced: usize) -> Self {
        Self::new(consumed, produced, Status::Ok)
    }

    /// The final step of a block.
    #[must_use]
    pub const fn end(consumed: usize, produced: usize) -> Self {
        Self::new(consumed, produced, Status::End)
    }

    /// A failed step; the codec must have populated the error slot.
    #[must_use]
    pub const fn error() -> Self {
        Self::new(0, 0, Status::Error)
    }

    /// Reports whether the step neither consumed nor produced anything.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.consumed == 0 && self.produced == 0
    }
}

/// Incremental transform plugged into a [`TranscodingStream`](crate::TranscodingStream).
///
/// Only [`Codec::process`] is mandatory.
pub trait Codec {
    /// Estimates the size of the transcoded form of `input`.
    ///
    /// Used to size the output of one-shot [`transcode`](crate::transcode) calls.
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len()
    }

    /// Minimum free output space the engine guarantees before calling [`Codec::process`].
    fn min_out_size(&self, input: Memory<'_>) -> usize {
        (input.len() / 4).max(1)
    }

    /// Acquires resources; runs once before any other method.
    fn initialize(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    /// Releases resources; runs at most once, only after a successful [`Codec::initialize`].
    fn finalize(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    /// Prepares the codec for a direction.
    fn start(&mut self, direction: Direction, error: &mut ErrorSlot) -> Status {
        let _ = (direction, error);
        Status::Ok
    }

    /// Transcodes bytes from `input` into `output`.
    ///
    /// An empty `input` signals the end of the data.
    fn process(
        &mut self,
        input: Memory<'_>,
        output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed;

    /// Reports whether output is always byte-identical to input.
    ///
    /// Streams consult this once at construction to collapse their two
    /// buffers into one and skip `process` calls entirely.
    fn is_passthrough(&self) -> bool {
        false
    }
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        (**self).expected_size(input)
    }

    fn min_out_size(&self, input: Memory<'_>) -> usize {
        (**self).min_out_size(input)
    }

    fn initialize(&mut self) -> Result<(), CodecError> {
        (**self).initialize()
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        (**self).finalize()
    }

    fn start(&mut self, direction: Direction, error: &mut ErrorSlot) -> Status {
        (**self).start(direction, error)
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        (**self).process(input, output, error)
    }

    fn is_passthrough(&self) -> bool {
        (**self).is_passthrough()
    }
}

impl<C: Codec + ?Sized> Codec for &mut C {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        (**self).expected_size(input)
    }

    fn min_out_size(&self, input: Memory<'_>) -> usize {
        (**self).min_out_size(input)
    }

    fn initialize(&mut self) -> Result<(), CodecError> {
        (**self).initialize()
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        (**self).finalize()
    }

    fn start(&mut self, direction: Direction, error: &mut ErrorSlot) -> Status {
        (**self).start(direction, error)
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        (**self).process(input, output, error)
    }

    fn is_passthrough(&self) -> bool {
        (**self).is_passthrough()
    }
}

/// Initialized codec that is finalized exactly once.
///
/// Finalization happens through [`CodecHandle::finalize`] or, failing that,
/// when the handle is dropped.
pub(crate) struct CodecHandle<C: Codec> {
    codec: C,
    finalized: bool,
}

impl<C: Codec> CodecHandle<C> {
    /// Runs [`Codec::initialize`]; on failure the codec is dropped untouched.
    pub(crate) fn initialize(mut codec: C) -> Result<Self, CodecError> {
        codec.initialize()?;
        Ok(Self {
            codec,
            finalized: false,
        })
    }

    pub(crate) const fn get(&self) -> &C {
        &self.codec
    }

    pub(crate) fn get_mut(&mut self) -> &mut C {
        &mut self.codec
    }

    pub(crate) const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Finalizes the codec unless that already happened.
    pub(crate) fn finalize(&mut self) -> Result<(), CodecError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.codec.finalize()
    }
}

impl<C: Codec> Drop for CodecHandle<C> {
    fn drop(&mut self) {
        if let Err(error) = self.finalize() {
            crate::trace::finalize_failed("drop", &error);
        }
    }
}
