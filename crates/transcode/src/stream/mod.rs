//! The transcoding stream engine.
//!
//! # Overview
//!
//! [`TranscodingStream`] sits between a consumer and a [`Resource`]. Bytes
//! pass through two buffers: the *near* buffer faces the consumer and the
//! *far* buffer faces the resource. The codec moves bytes from one to the
//! other, in whichever direction the stream was first used.
//!
//! # Layouts
//!
//! A pass-through codec collapses the pair into a single buffer and is never
//! asked to process anything. When the resource is itself a transcoding
//! stream and sharing is enabled, the far buffer is the inner stream's near
//! buffer, borrowed for the duration of each call.
//!
//! # Invariants
//!
//! - Every mode change goes through [`TranscodingStream::change_mode`].
//! - The codec is finalized at most once, including on drop.
//! - After a codec failure only [`TranscodingStream::close`] and
//!   [`TranscodingStream::is_open`] do anything useful.

mod io;
mod read;
mod shared;
mod write;

use std::fmt;

use crate::buffer::Buffer;
use crate::codec::{Codec, CodecHandle, Direction, Status};
use crate::config::StreamConfig;
use crate::error::{CodecError, Error};
use crate::resource::{Chained, Resource};
use crate::state::{Layout, Mode, State, Stats};
use crate::trace;

/// Stream that transcodes data flowing to or from a wrapped resource.
///
/// The first read or write fixes the direction for the lifetime of the
/// stream. Dropping a stream without [`close`](Self::close) finalizes the
/// codec but discards buffered data that was never flushed.
pub struct TranscodingStream<C: Codec, S> {
    codec: CodecHandle<C>,
    stream: S,
    state: State,
    config: StreamConfig,
    layout: Layout,
}

impl<C: Codec, S: Resource> TranscodingStream<C, S> {
    /// Wraps `stream` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`TranscodingStream::with_config`].
    pub fn new(codec: C, stream: S) -> Result<Self, Error> {
        Self::with_config(codec, stream, StreamConfig::default())
    }

    /// Wraps `stream`, initializing `codec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration,
    /// [`Error::ResourceClosed`] when `stream` is no longer open and
    /// [`Error::Initialize`] when the codec refuses to initialize.
    pub fn with_config(codec: C, mut stream: S, config: StreamConfig) -> Result<Self, Error> {
        config.validate()?;
        if !stream.is_open() {
            return Err(Error::ResourceClosed);
        }
        let shared = config.share_buffers && stream.as_chained().is_some();
        let layout = Layout::select(codec.is_passthrough(), shared);
        let codec = CodecHandle::initialize(codec).map_err(Error::Initialize)?;
        Ok(Self {
            codec,
            stream,
            state: State::new(layout, config.buffer_size),
            config,
            layout,
        })
    }

    /// Reports whether the stream has not been closed yet.
    ///
    /// A panicked stream is still open: it holds buffers until closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.mode != Mode::Closed
    }

    /// Returns the current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Returns the byte counters.
    #[must_use]
    pub const fn stats(&self) -> Stats {
        self.state.stats
    }

    /// Returns the codec failure that panicked the stream, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CodecError> {
        self.state.error.get()
    }

    /// Returns the codec.
    #[must_use]
    pub const fn codec(&self) -> &C {
        self.codec.get()
    }

    /// Returns the configuration the stream was built with.
    #[must_use]
    pub const fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Returns the wrapped resource.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Returns the wrapped resource mutably.
    ///
    /// Reading from or writing to it directly bypasses the stream's buffers.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Flushes pending output, finalizes the codec, releases the buffers and
    /// closes the resource.
    ///
    /// The stream ends in [`Mode::Closed`] whatever happens; the first error
    /// met along the way is returned. Closing a closed stream does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failure among draining the buffers, finalizing the
    /// codec and closing the resource.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.state.mode == Mode::Closed {
            return Ok(());
        }
        let shutdown = self.shutdown();
        let closed = Resource::close(&mut self.stream).map_err(Error::from);
        shutdown.and(closed)
    }

    /// Like [`close`](Self::close) but leaves the resource open.
    ///
    /// Use [`into_inner`](Self::into_inner) afterwards to take the resource back.
    ///
    /// # Errors
    ///
    /// Returns the first failure among draining the buffers, flushing the
    /// resource and finalizing the codec.
    pub fn finish(&mut self) -> Result<(), Error> {
        if self.state.mode == Mode::Closed {
            return Ok(());
        }
        self.shutdown()
    }

    /// Returns the resource, dropping the stream.
    ///
    /// Data still buffered is discarded; call [`finish`](Self::finish) first to keep it.
    pub fn into_inner(self) -> S {
        let Self { stream, .. } = self;
        stream
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        let flushed = if self.state.mode == Mode::Writing {
            self.flush_all()
        } else {
            Ok(())
        };
        let changed = self.change_mode(Mode::Closed);
        flushed.and(changed)
    }

    /// Performs a mode transition together with the codec calls it implies.
    ///
    /// Entering [`Mode::Closed`] always succeeds in changing the mode; an
    /// error only reports that finalization failed.
    pub(super) fn change_mode(&mut self, to: Mode) -> Result<(), Error> {
        let from = self.state.mode;
        match (from, to) {
            (Mode::Idle, Mode::Reading | Mode::Writing) => {
                let direction = if to == Mode::Reading {
                    Direction::Read
                } else {
                    Direction::Write
                };
                if self.layout.is_shared() {
                    chained(&mut self.stream)?.enter(direction)?;
                }
                self.set_mode(to);
                self.start_codec(direction)
            }
            (Mode::Idle | Mode::Reading | Mode::Writing, Mode::Closed) => {
                let finalized = self.codec.finalize();
                self.state.release_buffers();
                self.set_mode(Mode::Closed);
                finalized.map_err(Error::Finalize)
            }
            (Mode::Idle | Mode::Reading | Mode::Writing, Mode::Panicked) => {
                if let Err(error) = self.codec.finalize() {
                    trace::finalize_failed("panic", &error);
                }
                self.set_mode(Mode::Panicked);
                Ok(())
            }
            (Mode::Panicked, Mode::Closed) => {
                self.state.release_buffers();
                self.set_mode(Mode::Closed);
                Ok(())
            }
            _ => Err(Error::InvalidTransition { from, to }),
        }
    }

    fn set_mode(&mut self, to: Mode) {
        trace::transition(self.state.mode, to);
        self.state.mode = to;
    }

    /// Calls [`Codec::start`], panicking the stream on failure.
    pub(super) fn start_codec(&mut self, direction: Direction) -> Result<(), Error> {
        let status = self
            .codec
            .get_mut()
            .start(direction, &mut self.state.error);
        if status == Status::Error {
            return Err(self.fail());
        }
        self.state.code = Status::Ok;
        Ok(())
    }

    /// Moves the stream to [`Mode::Panicked`] and returns the error to surface.
    pub(super) fn fail(&mut self) -> Error {
        let error = self.state.error.get_or_insert_unknown();
        trace::codec_failed(self.state.mode, &error);
        match self.change_mode(Mode::Panicked) {
            Ok(()) => Error::Codec(error),
            Err(other) => other,
        }
    }

    /// Rejects every operation once the stream is closed or panicked.
    pub(super) fn check_usable(&self, operation: &'static str) -> Result<(), Error> {
        match self.state.mode {
            Mode::Closed => Err(Error::Protocol {
                operation,
                mode: Mode::Closed,
            }),
            Mode::Panicked => Err(self.broken()),
            Mode::Idle | Mode::Reading | Mode::Writing => Ok(()),
        }
    }

    fn broken(&self) -> Error {
        let error = self
            .state
            .error
            .get()
            .cloned()
            .unwrap_or_else(|| CodecError::msg("stream panicked"));
        Error::Broken(error)
    }

    /// Returns the buffer the consumer reads from or writes to.
    pub(super) fn near_mut(&mut self) -> Result<&mut Buffer, Error> {
        match self.layout {
            Layout::SharedSingle => chained(&mut self.stream)?.near_buffer(),
            Layout::Pair | Layout::Single | Layout::SharedFar => Ok(&mut self.state.near),
        }
    }

    /// Returns the number of bytes waiting in the far buffer.
    pub(super) fn far_len(&mut self) -> Result<usize, Error> {
        match self.layout {
            Layout::SharedFar => Ok(chained(&mut self.stream)?.near_buffer()?.len()),
            Layout::Pair => Ok(self.state.far.len()),
            Layout::Single | Layout::SharedSingle => Ok(0),
        }
    }
}

impl<C: Codec, S> fmt::Debug for TranscodingStream<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscodingStream")
            .field("mode", &self.state.mode)
            .field("layout", &self.layout)
            .field("config", &self.config)
            .field("stats", &self.state.stats)
            .finish_non_exhaustive()
    }
}

/// Borrows the buffer-sharing hooks of the wrapped stream.
fn chained<S: Resource>(stream: &mut S) -> Result<&mut dyn Chained, Error> {
    // Only reachable for resources that exposed the hooks at construction.
    stream.as_chained().ok_or(Error::ResourceClosed)
}
