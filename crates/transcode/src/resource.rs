//! Byte resources a transcoding stream can wrap.
//!
//! [`Resource`] is the small contract the engine needs from whatever sits
//! below it: a file, a socket, an in-memory buffer, or another
//! [`TranscodingStream`](crate::TranscodingStream). Reads may return fewer
//! bytes than requested once some data is ready, and `0` means the end of the
//! data. A direction a resource does not support reports
//! [`io::ErrorKind::Unsupported`].

use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::net::{Shutdown, TcpStream};

use crate::buffer::Buffer;
use crate::codec::Direction;
use crate::error::Error;

/// Underlying byte source or sink.
pub trait Resource {
    /// Reports whether the resource can still be used.
    fn is_open(&self) -> bool {
        true
    }

    /// Reads up to `buf.len()` bytes; returns `0` at the end of the data.
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let _ = buf;
        Err(unsupported("reading"))
    }

    /// Writes some prefix of `buf` and returns its length.
    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = buf;
        Err(unsupported("writing"))
    }

    /// Pushes buffered bytes to their destination.
    fn flush_out(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Releases the resource. Called when the owning stream closes.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Exposes the buffer-sharing hooks of a wrapped transcoding stream.
    fn as_chained(&mut self) -> Option<&mut dyn Chained> {
        None
    }
}

/// Buffer-sharing hooks between adjacent transcoding streams.
///
/// The outer stream drives the inner one through these calls, so only one of
/// them touches the shared buffer at any time.
pub trait Chained {
    /// Moves the stream into the mode matching `direction`.
    fn enter(&mut self, direction: Direction) -> Result<(), Error>;

    /// Returns the buffer next to the consumer of this stream.
    fn near_buffer(&mut self) -> Result<&mut Buffer, Error>;

    /// Appends more decoded bytes to the near buffer; returns how many, `0` at the end.
    fn pull(&mut self) -> Result<usize, Error>;

    /// Transcodes everything in the near buffer towards the resource.
    fn push(&mut self) -> Result<(), Error>;
}

fn unsupported(operation: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("resource does not support {operation}"),
    )
}

impl Resource for &[u8] {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }
}

impl Resource for Vec<u8> {
    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl Resource for Cursor<&[u8]> {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }
}

impl Resource for Cursor<Vec<u8>> {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }
}

impl Resource for File {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn flush_out(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn close(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

impl Resource for TcpStream {
    fn is_open(&self) -> bool {
        self.peer_addr().is_ok()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn flush_out(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            Err(error) if error.kind() != io::ErrorKind::NotConnected => Err(error),
            _ => Ok(()),
        }
    }
}

impl Resource for io::Stdin {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }
}

impl Resource for io::Stdout {
    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn flush_out(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn close(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

impl Resource for io::Empty {
    fn read_into(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

impl Resource for io::Sink {
    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
}

impl<R: Resource + ?Sized> Resource for Box<R> {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_into(buf)
    }

    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write_from(buf)
    }

    fn flush_out(&mut self) -> io::Result<()> {
        (**self).flush_out()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn as_chained(&mut self) -> Option<&mut dyn Chained> {
        (**self).as_chained()
    }
}

impl<R: Resource + ?Sized> Resource for &mut R {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_into(buf)
    }

    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write_from(buf)
    }

    fn flush_out(&mut self) -> io::Result<()> {
        (**self).flush_out()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn as_chained(&mut self) -> Option<&mut dyn Chained> {
        (**self).as_chained()
    }
}

/// Adapts any [`Read`] implementation into a read-only [`Resource`].
#[derive(Debug, Default)]
pub struct ReadResource<R> {
    inner: R,
}

impl<R: Read> ReadResource<R> {
    /// Wraps `reader`.
    pub const fn new(reader: R) -> Self {
        Self { inner: reader }
    }

    /// Returns the wrapped reader.
    pub const fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns the wrapped reader mutably.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwraps the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Resource for ReadResource<R> {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                other => return other,
            }
        }
    }
}

/// Adapts any [`Write`] implementation into a write-only [`Resource`].
#[derive(Debug, Default)]
pub struct WriteResource<W> {
    inner: W,
}

impl<W: Write> WriteResource<W> {
    /// Wraps `writer`.
    pub const fn new(writer: W) -> Self {
        Self { inner: writer }
    }

    /// Returns the wrapped writer.
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns the wrapped writer mutably.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Resource for WriteResource<W> {
    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match self.inner.write(buf) {
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                other => return other,
            }
        }
    }

    fn flush_out(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
