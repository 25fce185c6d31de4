//! Growable byte storage with independent read and write cursors.
//!
//! Bytes in `[head, tail)` are unread. The region after `tail` is free space a
//! producer may fill before calling [`Buffer::supply`]. Consumed space before
//! `head` is reclaimed by compaction, never by dropping unread bytes.

use crate::memory::{Memory, MemoryMut};

/// Byte buffer shared between a codec and the stream that drives it.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    data: Vec<u8>,
    head: usize,
    tail: usize,
}

impl Buffer {
    /// Creates a buffer with `capacity` bytes of storage.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            head: 0,
            tail: 0,
        }
    }

    /// Creates a buffer whose unread region holds a copy of `bytes`.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            head: 0,
            tail: bytes.len(),
        }
    }

    /// Returns the total storage size.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of unread bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tail - self.head
    }

    /// Reports whether no unread byte remains.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns the number of bytes that can be supplied without compaction or growth.
    #[inline]
    #[must_use]
    pub fn free(&self) -> usize {
        self.data.len() - self.tail
    }

    /// Returns the unread bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.head..self.tail]
    }

    /// Returns a view of the unread region.
    #[inline]
    #[must_use]
    pub fn readable(&self) -> Memory<'_> {
        Memory::new(self.as_slice())
    }

    /// Returns a view of the free region.
    #[inline]
    pub fn writable(&mut self) -> MemoryMut<'_> {
        MemoryMut::new(&mut self.data[self.tail..])
    }

    /// Marks `n` unread bytes as consumed.
    ///
    /// # Panics
    ///
    /// Panics when `n` exceeds [`Buffer::len`]; that is a caller bug.
    #[inline]
    pub fn consume(&mut self, n: usize) {
        assert!(
            n <= self.len(),
            "cannot consume {n} bytes from a buffer holding {}",
            self.len()
        );
        self.head += n;
        if self.head == self.tail {
            self.head = 0;
            self.tail = 0;
        }
    }

    /// Marks `n` bytes written into the free region as unread data.
    ///
    /// # Panics
    ///
    /// Panics when `n` exceeds [`Buffer::free`]; that is a caller bug.
    #[inline]
    pub fn supply(&mut self, n: usize) {
        assert!(
            n <= self.free(),
            "cannot supply {n} bytes to a buffer with {} free",
            self.free()
        );
        self.tail += n;
    }

    /// Moves unread bytes to the start of the storage.
    pub fn compact(&mut self) {
        if self.head == 0 {
            return;
        }
        let len = self.len();
        self.data.copy_within(self.head..self.tail, 0);
        self.head = 0;
        self.tail = len;
    }

    /// Guarantees at least `min_free` bytes of free space and returns the free size.
    ///
    /// Compacts first and reallocates only when compaction is not enough. The
    /// unread range is always preserved.
    pub fn make_room(&mut self, min_free: usize) -> usize {
        if self.free() >= min_free {
            return self.free();
        }
        self.compact();
        if self.free() < min_free {
            let required = self.len() + min_free;
            let grown = self.capacity().saturating_mul(2).max(required);
            self.data.resize(grown, 0);
        }
        self.free()
    }

    /// Copies as much of `bytes` as fits in the free region and returns the count.
    pub fn copy_from(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.free());
        self.data[self.tail..self.tail + n].copy_from_slice(&bytes[..n]);
        self.tail += n;
        n
    }

    /// Copies unread bytes into `out`, consuming them, and returns the count.
    pub fn copy_to(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.len());
        out[..n].copy_from_slice(&self.data[self.head..self.head + n]);
        self.consume(n);
        n
    }

    /// Inserts `bytes` in front of the unread region.
    ///
    /// Consumed space before the read cursor is reused when it is large
    /// enough; otherwise the unread bytes are shifted, growing the storage
    /// when needed.
    pub fn prepend(&mut self, bytes: &[u8]) {
        let n = bytes.len();
        if n == 0 {
            return;
        }
        if self.head >= n {
            self.head -= n;
            self.data[self.head..self.head + n].copy_from_slice(bytes);
            return;
        }
        let len = self.len();
        if self.capacity() < len + n {
            let grown = self.capacity().saturating_mul(2).max(len + n);
            self.data.resize(grown, 0);
        }
        self.data.copy_within(self.head..self.tail, n);
        self.data[..n].copy_from_slice(bytes);
        self.head = 0;
        self.tail = len + n;
    }

    /// Discards all bytes and frees the storage.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.head = 0;
        self.tail = 0;
    }

    /// Consumes the buffer and returns its unread bytes.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.truncate(self.tail);
        self.data.drain(..self.head);
        self.data
    }
}
