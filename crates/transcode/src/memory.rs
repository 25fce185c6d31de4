//! Borrowed views handed to codecs.
//!
//! A [`Memory`] describes the unread region of a buffer and a [`MemoryMut`]
//! its free region. Both borrow from the owning [`Buffer`](crate::Buffer), so
//! a view can never outlive the storage it describes or survive a call that
//! reallocates it.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Read-only view over a contiguous byte region.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct Memory<'a> {
    bytes: &'a [u8],
}

impl<'a> Memory<'a> {
    /// Creates a view over `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Returns an empty view, the end-of-stream marker for [`Codec::process`](crate::Codec::process).
    #[must_use]
    pub const fn empty() -> Self {
        Self { bytes: &[] }
    }

    /// Returns the logical size of the region.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Reports whether the region is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the viewed bytes with the lifetime of the underlying storage.
    #[must_use]
    pub const fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }
}

impl Deref for Memory<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> From<&'a [u8]> for Memory<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for Memory<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory").field("len", &self.len()).finish()
    }
}

/// Writable view over the free region of a buffer.
#[derive(Default)]
pub struct MemoryMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> MemoryMut<'a> {
    /// Creates a writable view over `bytes`.
    #[must_use]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// Returns the number of bytes a codec may write.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Reports whether no byte can be written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the writable bytes.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.bytes
    }

    /// Consumes the view and returns the slice with the lifetime of the storage.
    #[must_use]
    pub fn into_slice(self) -> &'a mut [u8] {
        self.bytes
    }
}

impl Deref for MemoryMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl DerefMut for MemoryMut<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.bytes
    }
}

impl<'a> From<&'a mut [u8]> for MemoryMut<'a> {
    fn from(bytes: &'a mut [u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for MemoryMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMut").field("len", &self.len()).finish()
    }
}
