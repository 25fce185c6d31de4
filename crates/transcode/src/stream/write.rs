//! Write direction: consumer, near buffer, codec, far buffer, resource.

use std::io;

use super::{TranscodingStream, chained};
use crate::buffer::Buffer;
use crate::codec::{Codec, Direction, Processed, Status};
use crate::error::Error;
use crate::progress::{Backoff, checked};
use crate::resource::Resource;
use crate::state::{Layout, Mode};
use crate::trace;

impl<C: Codec, S: Resource> TranscodingStream<C, S> {
    /// Accepts `data`, transcoding whenever the near buffer fills up.
    ///
    /// Returns `data.len()` unless the resource fails after some bytes were
    /// already buffered. Those bytes are then reported as written and the
    /// failure is left for the next call to meet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] when the stream is reading or closed,
    /// [`Error::Broken`] after an earlier codec failure, and the codec or
    /// resource failure otherwise. A codec failure is always returned, even
    /// after a partial write, since the stream cannot continue.
    pub fn try_write(&mut self, data: &[u8]) -> Result<usize, Error> {
        self.ready_to_write("write")?;
        let mut written = 0;
        while written < data.len() {
            if self.near_mut()?.free() == 0 {
                if let Err(error) = self.drain_near() {
                    if written == 0 || self.state.mode == Mode::Panicked {
                        return Err(error);
                    }
                    break;
                }
            }
            let near = self.near_mut()?;
            near.make_room(1);
            written += near.copy_from(&data[written..]);
        }
        self.state.stats.add_input(written);
        Ok(written)
    }

    /// Ends the current block.
    ///
    /// Everything buffered is transcoded and the codec is told that the data
    /// ended, then its output is handed to the resource. The next write
    /// starts a new block. Call [`try_flush`](Self::try_flush) to push the
    /// resource's own buffers as well.
    ///
    /// # Errors
    ///
    /// Same as [`try_write`](Self::try_write).
    pub fn write_end(&mut self) -> Result<(), Error> {
        self.ready_to_write("write")?;
        if self.layout.is_passthrough() {
            return Ok(());
        }
        self.encode(true)
    }

    /// Transcodes buffered input and flushes the resource.
    ///
    /// The codec may hold back data until the block ends; see
    /// [`write_end`](Self::write_end). Flushing an idle or reading stream
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] on a closed stream, [`Error::Broken`]
    /// after a codec failure, and the codec or resource failure otherwise.
    pub fn try_flush(&mut self) -> Result<(), Error> {
        match self.state.mode {
            Mode::Writing => {
                self.drain_near()?;
                Resource::flush_out(&mut self.stream)?;
                Ok(())
            }
            Mode::Idle | Mode::Reading => Ok(()),
            Mode::Closed | Mode::Panicked => self.check_usable("flush"),
        }
    }

    pub(super) fn ready_to_write(&mut self, operation: &'static str) -> Result<(), Error> {
        match self.state.mode {
            Mode::Writing => Ok(()),
            Mode::Idle => self.change_mode(Mode::Writing),
            Mode::Reading => Err(Error::Protocol {
                operation,
                mode: Mode::Reading,
            }),
            Mode::Closed | Mode::Panicked => self.check_usable(operation),
        }
    }

    /// Ends the block and delivers everything before the stream closes.
    pub(super) fn flush_all(&mut self) -> Result<(), Error> {
        if self.layout.is_passthrough() {
            self.push_far()?;
        } else {
            self.encode(true)?;
        }
        Resource::flush_out(&mut self.stream)?;
        Ok(())
    }

    /// Empties the near buffer towards the resource.
    pub(super) fn drain_near(&mut self) -> Result<(), Error> {
        if self.layout.is_passthrough() {
            self.push_far()
        } else {
            self.encode(false)
        }
    }

    /// Runs the codec over the near buffer.
    ///
    /// With `finish`, the codec is then called on empty input until it
    /// reports the end of the block.
    fn encode(&mut self, finish: bool) -> Result<(), Error> {
        let mut backoff = Backoff::default();
        loop {
            let pending = !self.state.near.is_empty();
            if !pending && (!finish || self.state.code == Status::End) {
                break;
            }
            if pending && self.state.code == Status::End {
                trace::restart(Direction::Write);
                self.start_codec(Direction::Write)?;
            }

            let step = self.process_write(backoff.margin)?;
            match step.status {
                Status::Error => return Err(self.fail()),
                Status::End => self.state.code = Status::End,
                Status::Ok => {}
            }
            if step.status == Status::Ok && step.is_idle() {
                if self.far_len()? == 0 {
                    backoff.stalled(self.state.mode)?;
                } else {
                    self.push_far()?;
                }
            } else {
                backoff.progressed();
                if self.far_len()? >= self.config.buffer_size {
                    self.push_far()?;
                }
            }
        }
        self.push_far()
    }

    /// Runs one codec step from the near buffer into the far buffer.
    fn process_write(&mut self, margin: usize) -> Result<Processed, Error> {
        let Self {
            codec,
            stream,
            state,
            layout,
            ..
        } = self;
        let far = match layout {
            Layout::SharedFar => chained(stream)?.near_buffer()?,
            _ => &mut state.far,
        };

        let input = state.near.readable();
        far.make_room(codec.get().min_out_size(input).saturating_add(margin));
        let (input_len, output_len) = (input.len(), far.free());
        let step = codec
            .get_mut()
            .process(input, far.writable(), &mut state.error);
        let step = checked(step, input_len, output_len, &mut state.error);

        state.near.consume(step.consumed);
        far.supply(step.produced);
        state.stats.add_transcoded(step.consumed, step.produced);
        trace::process(Direction::Write, input_len, &step);
        Ok(step)
    }

    /// Hands the far side to the resource.
    pub(super) fn push_far(&mut self) -> Result<(), Error> {
        let Self {
            stream,
            state,
            layout,
            ..
        } = self;
        let pushed = match layout {
            Layout::Pair => write_resource(stream, &mut state.far)?,
            Layout::Single => write_resource(stream, &mut state.near)?,
            Layout::SharedFar | Layout::SharedSingle => {
                let inner = chained(stream)?;
                let pending = inner.near_buffer()?.len();
                inner.push()?;
                pending
            }
        };
        if pushed > 0 {
            state.stats.add_output(pushed);
            trace::resource_io(Direction::Write, pushed);
        }
        Ok(())
    }
}

fn write_resource<S: Resource>(stream: &mut S, buffer: &mut Buffer) -> Result<usize, Error> {
    let mut total = 0;
    while !buffer.is_empty() {
        match stream.write_from(buffer.as_slice()) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "resource accepted no bytes",
                )
                .into());
            }
            Ok(n) => {
                buffer.consume(n);
                total += n;
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(total)
}
