//! Pass-through codec.
//!
//! [`Noop`] leaves data untouched. A stream built with it keeps a single
//! buffer and never calls [`Codec::process`], which turns it into a plain
//! buffering layer. The `process` implementation still exists so the codec
//! behaves correctly when driven directly, for instance by
//! [`Transcoder`](crate::Transcoder).

use crate::codec::{Codec, Processed};
use crate::error::ErrorSlot;
use crate::memory::{Memory, MemoryMut};
use crate::stream::TranscodingStream;

/// Codec that copies input to output unchanged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Noop;

impl Codec for Noop {
    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        _error: &mut ErrorSlot,
    ) -> Processed {
        if input.is_empty() {
            return Processed::end(0, 0);
        }
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Processed::ok(n, n)
    }

    fn is_passthrough(&self) -> bool {
        true
    }
}

/// Buffered stream that does not transform its data.
pub type NoopStream<S> = TranscodingStream<Noop, S>;
