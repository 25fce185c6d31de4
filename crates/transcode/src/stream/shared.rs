//! A transcoding stream used as the resource of another one.

use std::io;

use super::TranscodingStream;
use crate::buffer::Buffer;
use crate::codec::{Codec, Direction};
use crate::error::Error;
use crate::resource::{Chained, Resource};
use crate::state::Mode;

impl<C: Codec, S: Resource> Chained for TranscodingStream<C, S> {
    fn enter(&mut self, direction: Direction) -> Result<(), Error> {
        match direction {
            Direction::Read => self.ready_to_read("read"),
            Direction::Write => self.ready_to_write("write"),
        }
    }

    fn near_buffer(&mut self) -> Result<&mut Buffer, Error> {
        self.check_usable("share the buffer of")?;
        self.near_mut()
    }

    fn pull(&mut self) -> Result<usize, Error> {
        self.ready_to_read("read")?;
        let before = self.near_mut()?.len();
        if !self.fill_more()? {
            return Ok(0);
        }
        let pulled = self.near_mut()?.len().saturating_sub(before);
        self.state.stats.add_output(pulled);
        Ok(pulled)
    }

    fn push(&mut self) -> Result<(), Error> {
        self.ready_to_write("write")?;
        let pending = self.near_mut()?.len();
        self.state.stats.add_input(pending);
        self.drain_near()
    }
}

impl<C: Codec, S: Resource> Resource for TranscodingStream<C, S> {
    fn is_open(&self) -> bool {
        self.state.mode != Mode::Closed
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.try_read(buf)?)
    }

    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.try_write(buf)?)
    }

    fn flush_out(&mut self) -> io::Result<()> {
        Ok(self.try_flush()?)
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(Self::close(self)?)
    }

    fn as_chained(&mut self) -> Option<&mut dyn Chained> {
        Some(self)
    }
}
