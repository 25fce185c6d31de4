//! [`std::io`] traits on top of the typed stream operations.
//!
//! Stream errors travel inside [`io::Error`]; [`Error::from_io`](crate::Error::from_io)
//! recovers them.

use std::io::{self, BufRead, Read, Write};

use super::TranscodingStream;
use crate::codec::Codec;
use crate::resource::Resource;

impl<C: Codec, S: Resource> Read for TranscodingStream<C, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.try_read(buf)?)
    }
}

impl<C: Codec, S: Resource> BufRead for TranscodingStream<C, S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.ready_to_read("read")?;
        self.fill_near()?;
        Ok(self.near_mut()?.as_slice())
    }

    fn consume(&mut self, amt: usize) {
        let consumed = match self.near_mut() {
            Ok(near) => {
                let n = amt.min(near.len());
                near.consume(n);
                n
            }
            // Closed or panicked: there is nothing to consume, and the
            // next read reports the error.
            Err(_) => 0,
        };
        self.state.stats.add_output(consumed);
    }
}

impl<C: Codec, S: Resource> Write for TranscodingStream<C, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.try_write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.try_flush()?)
    }
}
