//! Structured diagnostics for the stream engine.
//!
//! Every helper has a no-op twin so call sites stay free of `cfg` noise when
//! the `tracing` feature is disabled.

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

use crate::codec::{Direction, Processed};
use crate::error::CodecError;
use crate::state::Mode;

/// Trace a mode transition.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn transition(from: Mode, to: Mode) {
    debug!(
        target: "transcode::stream",
        from = from.name(),
        to = to.name(),
        "mode {} -> {}",
        from,
        to
    );
}

/// Trace a mode transition - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn transition(_from: Mode, _to: Mode) {}

/// Trace one codec step.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn process(direction: Direction, input: usize, step: &Processed) {
    trace!(
        target: "transcode::stream",
        direction = direction.name(),
        input,
        consumed = step.consumed,
        produced = step.produced,
        status = ?step.status,
        "process"
    );
}

/// Trace one codec step - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn process(_direction: Direction, _input: usize, _step: &Processed) {}

/// Trace bytes moved between the stream and its resource.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn resource_io(direction: Direction, bytes: usize) {
    trace!(
        target: "transcode::stream",
        direction = direction.name(),
        bytes,
        "resource {}",
        direction
    );
}

/// Trace bytes moved between the stream and its resource - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn resource_io(_direction: Direction, _bytes: usize) {}

/// Trace a codec restart after an end status.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn restart(direction: Direction) {
    debug!(
        target: "transcode::stream",
        direction = direction.name(),
        "restarting codec for a new block"
    );
}

/// Trace a codec restart - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn restart(_direction: Direction) {}

/// Trace a codec failure that poisoned the stream.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn codec_failed(mode: Mode, error: &CodecError) {
    debug!(
        target: "transcode::stream",
        mode = mode.name(),
        %error,
        "codec failed; stream panicked"
    );
}

/// Trace a codec failure - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn codec_failed(_mode: Mode, _error: &CodecError) {}

/// Report a finalize failure that could not be surfaced to a caller.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn finalize_failed(context: &'static str, error: &CodecError) {
    warn!(
        target: "transcode::stream",
        context,
        %error,
        "codec finalization failed; buffered data may be lost"
    );
}

/// Report a finalize failure - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn finalize_failed(_context: &'static str, _error: &CodecError) {}
