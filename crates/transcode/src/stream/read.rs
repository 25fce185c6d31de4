//! Read direction: resource, far buffer, codec, near buffer, consumer.

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
    /// Reads transcoded bytes into `buf`.
    ///
    /// Follows [`std::io::Read::read`]: buffered bytes are returned without
    /// touching the resource, otherwise the stream refills until at least
    /// one byte is ready. `0` means the end of the data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] when the stream is writing or closed,
    /// [`Error::Broken`] after an earlier codec failure, and the codec or
    /// resource failure otherwise.
    pub fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.ready_to_read("read")?;
        if buf.is_empty() || self.fill_near()? == 0 {
            return Ok(0);
        }
        let n = self.near_mut()?.copy_to(buf);
        self.state.stats.add_output(n);
        Ok(n)
    }

    /// Reads until `buf` is full or the data ends; returns the count.
    ///
    /// # Errors
    ///
    /// Same as [`try_read`](Self::try_read).
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.try_read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Pushes `data` back so the next reads return it before anything else.
    ///
    /// The resource is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] unless the stream is idle or reading.
    pub fn unread(&mut self, data: &[u8]) -> Result<(), Error> {
        self.ready_to_read("unread")?;
        self.near_mut()?.prepend(data);
        Ok(())
    }

    /// Reports whether no further byte can be read.
    ///
    /// May refill the buffers to find out.
    ///
    /// # Errors
    ///
    /// Same as [`try_read`](Self::try_read).
    pub fn is_eof(&mut self) -> Result<bool, Error> {
        self.ready_to_read("check for the end of")?;
        Ok(self.fill_near()? == 0)
    }

    /// Discards up to `n` transcoded bytes and returns how many were skipped.
    ///
    /// # Errors
    ///
    /// Same as [`try_read`](Self::try_read).
    pub fn skip(&mut self, n: usize) -> Result<usize, Error> {
        self.ready_to_read("skip")?;
        let mut skipped = 0;
        while skipped < n {
            let available = self.fill_near()?;
            if available == 0 {
                break;
            }
            let step = available.min(n - skipped);
            self.near_mut()?.consume(step);
            skipped += step;
        }
        self.state.stats.add_output(skipped);
        Ok(skipped)
    }

    pub(super) fn ready_to_read(&mut self, operation: &'static str) -> Result<(), Error> {
        match self.state.mode {
            Mode::Reading => Ok(()),
            Mode::Idle => self.change_mode(Mode::Reading),
            Mode::Writing => Err(Error::Protocol {
                operation,
                mode: Mode::Writing,
            }),
            Mode::Closed | Mode::Panicked => self.check_usable(operation),
        }
    }

    /// Returns the unread length of the near buffer, refilling it when empty.
    pub(super) fn fill_near(&mut self) -> Result<usize, Error> {
        loop {
            let available = self.near_mut()?.len();
            if available > 0 {
                return Ok(available);
            }
            if !self.fill_more()? {
                return Ok(0);
            }
        }
    }

    /// Appends at least one byte to the near buffer; `false` once the data has ended.
    pub(super) fn fill_more(&mut self) -> Result<bool, Error> {
        if self.layout.is_passthrough() {
            if self.state.source_exhausted {
                return Ok(false);
            }
            return Ok(self.refill()? > 0);
        }

        let mut backoff = Backoff::default();
        let mut starved = false;
        loop {
            if self.state.end_of_data && !self.restart_member()? {
                return Ok(false);
            }
            if (starved || self.far_len()? == 0) && !self.state.source_exhausted {
                self.refill()?;
                starved = false;
            }

            let step = self.process_read(backoff.margin)?;
            match step.status {
                Status::Error => return Err(self.fail()),
                Status::End => {
                    self.state.code = Status::End;
                    self.state.end_of_data = true;
                }
                Status::Ok => {}
            }
            if step.produced > 0 {
                return Ok(true);
            }
            if step.status == Status::End || step.consumed > 0 {
                backoff.progressed();
            } else if self.state.source_exhausted {
                backoff.stalled(self.state.mode)?;
            } else {
                starved = true;
            }
        }
    }

    /// Restarts the codec when another member follows the one that just ended.
    fn restart_member(&mut self) -> Result<bool, Error> {
        if !self.config.concatenated {
            return Ok(false);
        }
        if self.far_len()? == 0 && (self.state.source_exhausted || self.refill()? == 0) {
            return Ok(false);
        }
        trace::restart(Direction::Read);
        self.state.end_of_data = false;
        self.start_codec(Direction::Read)?;
        Ok(true)
    }

    /// Reads more bytes from the resource into the far side; returns the count.
    pub(super) fn refill(&mut self) -> Result<usize, Error> {
        let Self {
            stream,
            state,
            layout,
            ..
        } = self;
        let n = match layout {
            Layout::SharedFar | Layout::SharedSingle => chained(stream)?.pull()?,
            Layout::Pair => read_resource(stream, &mut state.far)?,
            Layout::Single => read_resource(stream, &mut state.near)?,
        };
        if n == 0 {
            state.source_exhausted = true;
        } else {
            state.stats.add_input(n);
        }
        trace::resource_io(Direction::Read, n);
        Ok(n)
    }

    /// Runs one codec step from the far buffer into the near buffer.
    fn process_read(&mut self, margin: usize) -> Result<Processed, Error> {
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
        let near = &mut state.near;

        let input = far.readable();
        near.make_room(codec.get().min_out_size(input).saturating_add(margin));
        let (input_len, output_len) = (input.len(), near.free());
        let step = codec
            .get_mut()
            .process(input, near.writable(), &mut state.error);
        let step = checked(step, input_len, output_len, &mut state.error);

        far.consume(step.consumed);
        near.supply(step.produced);
        state.stats.add_transcoded(step.consumed, step.produced);
        trace::process(Direction::Read, input_len, &step);
        Ok(step)
    }
}

fn read_resource<S: Resource>(stream: &mut S, buffer: &mut Buffer) -> Result<usize, Error> {
    buffer.make_room(1);
    loop {
        match stream.read_into(buffer.writable().into_slice()) {
            Ok(n) => {
                buffer.supply(n);
                return Ok(n);
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }
}
