//! Guards around codec progress shared by streams and one-shot transcoders.

use crate::codec::Processed;
use crate::error::{CodecError, Error, ErrorSlot};
use crate::state::Mode;

/// Number of consecutive zero-progress codec calls tolerated once input can no longer grow.
pub(crate) const MAX_STALLS: u32 = 12;

/// Extra output space requested after the first stall.
pub(crate) const MIN_MARGIN: usize = 16;

/// Rejects counts a codec could not have honoured.
///
/// A step claiming more input or output than it was offered becomes an
/// error step, with a message stored unless the codec already left one.
pub(crate) fn checked(
    step: Processed,
    input_len: usize,
    output_len: usize,
    error: &mut ErrorSlot,
) -> Processed {
    if step.consumed <= input_len && step.produced <= output_len {
        return step;
    }
    if !error.is_set() {
        error.set(CodecError::msg(format!(
            "codec reported {} of {input_len} input bytes consumed and {} of {output_len} output bytes produced",
            step.consumed, step.produced
        )));
    }
    Processed::error()
}

/// Output margin that widens while a codec keeps making no progress.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    pub(crate) margin: usize,
    stalls: u32,
}

impl Backoff {
    pub(crate) fn stalled(&mut self, mode: Mode) -> Result<(), Error> {
        self.stalls += 1;
        if self.stalls > MAX_STALLS {
            return Err(Error::Stalled { mode });
        }
        self.margin = self.margin.saturating_mul(2).max(MIN_MARGIN);
        Ok(())
    }

    pub(crate) const fn progressed(&mut self) {
        self.stalls = 0;
    }
}
