//! Mutable state owned by a transcoding stream.

use std::fmt;

use crate::buffer::Buffer;
use crate::codec::Status;
use crate::error::ErrorSlot;

/// Life-cycle mode of a stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    /// Freshly built; nothing buffered and the codec not started.
    #[default]
    Idle,
    /// Serving transcoded bytes to the consumer.
    Reading,
    /// Accepting bytes from the consumer.
    Writing,
    /// Terminal; buffers released.
    Closed,
    /// A codec failure poisoned the stream; only close is allowed.
    Panicked,
}

impl Mode {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Writing => "writing",
            Self::Closed => "closed",
            Self::Panicked => "panicked",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte counters kept by every stream.
///
/// In read mode `input` counts bytes taken from the resource and `output`
/// bytes handed to the consumer; in write mode `input` counts bytes accepted
/// from the consumer and `output` bytes delivered to the resource.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Bytes entering the stream.
    pub input: u64,
    /// Bytes leaving the stream.
    pub output: u64,
    /// Bytes consumed by the codec.
    pub transcoded_in: u64,
    /// Bytes produced by the codec.
    pub transcoded_out: u64,
}

impl Stats {
    pub(crate) fn add_input(&mut self, n: usize) {
        self.input = self.input.saturating_add(n as u64);
    }

    pub(crate) fn add_output(&mut self, n: usize) {
        self.output = self.output.saturating_add(n as u64);
    }

    pub(crate) fn add_transcoded(&mut self, consumed: usize, produced: usize) {
        self.transcoded_in = self.transcoded_in.saturating_add(consumed as u64);
        self.transcoded_out = self.transcoded_out.saturating_add(produced as u64);
    }
}

/// Where a stream keeps its buffers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Layout {
    /// Near and far buffers both owned.
    Pair,
    /// One owned buffer serves both sides; the codec is never called.
    Single,
    /// Near buffer owned; the far buffer is the wrapped stream's near buffer.
    SharedFar,
    /// No buffer owned; the wrapped stream's near buffer serves both sides.
    SharedSingle,
}

impl Layout {
    pub(crate) const fn select(passthrough: bool, shared: bool) -> Self {
        match (passthrough, shared) {
            (false, false) => Self::Pair,
            (true, false) => Self::Single,
            (false, true) => Self::SharedFar,
            (true, true) => Self::SharedSingle,
        }
    }

    /// Reports whether the codec is bypassed.
    pub(crate) const fn is_passthrough(self) -> bool {
        matches!(self, Self::Single | Self::SharedSingle)
    }

    /// Reports whether the far side lives in the wrapped stream.
    pub(crate) const fn is_shared(self) -> bool {
        matches!(self, Self::SharedFar | Self::SharedSingle)
    }
}

/// Everything about a stream that changes after construction.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) mode: Mode,
    /// Status of the most recent `start` or `process` call.
    pub(crate) code: Status,
    pub(crate) error: ErrorSlot,
    /// Buffer next to the consumer; unused for [`Layout::SharedSingle`].
    pub(crate) near: Buffer,
    /// Buffer next to the resource; only [`Layout::Pair`] gives it storage.
    pub(crate) far: Buffer,
    /// The resource reported end of data.
    pub(crate) source_exhausted: bool,
    /// No further byte will be decoded.
    pub(crate) end_of_data: bool,
    pub(crate) stats: Stats,
}

impl State {
    pub(crate) fn new(layout: Layout, buffer_size: usize) -> Self {
        let near = match layout {
            Layout::SharedSingle => Buffer::default(),
            _ => Buffer::with_capacity(buffer_size),
        };
        let far = match layout {
            Layout::Pair => Buffer::with_capacity(buffer_size),
            _ => Buffer::default(),
        };
        Self {
            mode: Mode::Idle,
            code: Status::Ok,
            error: ErrorSlot::new(),
            near,
            far,
            source_exhausted: false,
            end_of_data: false,
            stats: Stats::default(),
        }
    }

    /// Frees both buffers.
    pub(crate) fn release_buffers(&mut self) {
        self.near.release();
        self.far.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_selection() {
        assert_eq!(Layout::select(false, false), Layout::Pair);
        assert_eq!(Layout::select(true, false), Layout::Single);
        assert_eq!(Layout::select(false, true), Layout::SharedFar);
        assert_eq!(Layout::select(true, true), Layout::SharedSingle);
        assert!(Layout::SharedSingle.is_passthrough());
        assert!(Layout::SharedFar.is_shared());
        assert!(!Layout::Pair.is_shared());
    }

    #[test]
    fn pair_layout_allocates_two_buffers() {
        let state = State::new(Layout::Pair, 32);
        assert_eq!(state.near.capacity(), 32);
        assert_eq!(state.far.capacity(), 32);
        assert_eq!(state.mode, Mode::Idle);
    }

    #[test]
    fn single_layout_allocates_one_buffer() {
        let state = State::new(Layout::Single, 32);
        assert_eq!(state.near.capacity(), 32);
        assert_eq!(state.far.capacity(), 0);
    }

    #[test]
    fn shared_single_layout_owns_no_storage() {
        let state = State::new(Layout::SharedSingle, 32);
        assert_eq!(state.near.capacity(), 0);
        assert_eq!(state.far.capacity(), 0);
    }

    #[test]
    fn release_frees_storage() {
        let mut state = State::new(Layout::Pair, 8);
        state.release_buffers();
        assert_eq!(state.near.capacity(), 0);
        assert_eq!(state.far.capacity(), 0);
    }

    #[test]
    fn mode_names_are_lowercase() {
        assert_eq!(Mode::Panicked.to_string(), "panicked");
        assert_eq!(Mode::default(), Mode::Idle);
    }
}
