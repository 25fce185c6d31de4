#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Shared fixtures for transcode tests.
//!
//! The codecs here are deliberately simple so tests can predict every byte:
//! [`Doubling`] and [`Halving`] form an inverse pair with a 1:2 ratio,
//! [`Failing`] fails at a chosen stage, and [`Recording`] logs every call a
//! stream makes into a [`CallLog`]. [`TrickleReader`] and [`BoundedWriter`]
//! are resources that move only a few bytes per call.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::TempDir;
use transcode::{
    Codec, CodecError, Direction, ErrorSlot, Memory, MemoryMut, Processed, Resource, Status,
};

/// Emits every input byte twice.
#[derive(Clone, Copy, Debug, Default)]
pub struct Doubling;

impl Codec for Doubling {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len() * 2
    }

    fn min_out_size(&self, _input: Memory<'_>) -> usize {
        2
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        _error: &mut ErrorSlot,
    ) -> Processed {
        if input.is_empty() {
            return Processed::end(0, 0);
        }
        let n = input.len().min(output.len() / 2);
        for (i, byte) in input[..n].iter().enumerate() {
            output[2 * i] = *byte;
            output[2 * i + 1] = *byte;
        }
        Processed::ok(n, 2 * n)
    }
}

/// Keeps every other byte; the inverse of [`Doubling`].
///
/// Mismatched pairs and an odd byte left at the end of the data are
/// reported as errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Halving {
    pending: Option<u8>,
}

impl Codec for Halving {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        input.len() / 2
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        if input.is_empty() {
            if self.pending.is_some() {
                error.set("odd number of bytes");
                return Processed::error();
            }
            return Processed::end(0, 0);
        }
        let (mut consumed, mut produced) = (0, 0);
        while consumed < input.len() && (self.pending.is_none() || produced < output.len()) {
            let byte = input[consumed];
            consumed += 1;
            match self.pending.take() {
                None => self.pending = Some(byte),
                Some(first) if first == byte => {
                    output[produced] = first;
                    produced += 1;
                }
                Some(first) => {
                    error.set(format!("pair {first:#04x} {byte:#04x} differs"));
                    return Processed::error();
                }
            }
        }
        Processed::ok(consumed, produced)
    }
}

/// Stage at which a [`Failing`] codec reports an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailAt {
    /// `initialize` returns an error.
    Initialize,
    /// `start` returns [`Status::Error`].
    Start,
    /// The process call with this zero-based index returns [`Status::Error`].
    Process(usize),
    /// Processing succeeds but `finalize` returns an error.
    Finalize,
}

/// Pass-through codec that fails at a configured stage.
///
/// It copies bytes like [`transcode::Noop`] without advertising itself as
/// pass-through, so streams call `process` on it.
#[derive(Debug)]
pub struct Failing {
    stage: FailAt,
    calls: usize,
    log: CallLog,
}

impl Failing {
    /// Creates a codec failing at `stage`.
    #[must_use]
    pub fn new(stage: FailAt) -> Self {
        Self {
            stage,
            calls: 0,
            log: CallLog::default(),
        }
    }

    /// Returns a handle on the calls this codec receives.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Codec for Failing {
    fn initialize(&mut self) -> Result<(), CodecError> {
        self.log.push(Call::Initialize);
        if self.stage == FailAt::Initialize {
            return Err(CodecError::msg("initialize failed"));
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        self.log.push(Call::Finalize);
        if self.stage == FailAt::Finalize {
            return Err(CodecError::msg("finalize failed"));
        }
        Ok(())
    }

    fn start(&mut self, direction: Direction, error: &mut ErrorSlot) -> Status {
        self.log.push(Call::Start(direction));
        if self.stage == FailAt::Start {
            error.set("start failed");
            return Status::Error;
        }
        Status::Ok
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        mut output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        self.log.push(Call::Process {
            input: input.len(),
            output: output.len(),
        });
        let index = self.calls;
        self.calls += 1;
        if self.stage == FailAt::Process(index) {
            error.set(format!("process call {index} failed"));
            return Processed::error();
        }
        if input.is_empty() {
            return Processed::end(0, 0);
        }
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Processed::ok(n, n)
    }
}

/// One codec call observed by a [`CallLog`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Call {
    /// `initialize` ran.
    Initialize,
    /// `start` ran in the given direction.
    Start(Direction),
    /// `process` ran with views of these lengths.
    Process {
        /// Length of the input view.
        input: usize,
        /// Length of the output view.
        output: usize,
    },
    /// `finalize` ran.
    Finalize,
}

/// Shared, cloneable record of codec calls.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    fn push(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Returns a snapshot of the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counts recorded calls matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    /// Counts `finalize` calls.
    #[must_use]
    pub fn finalized(&self) -> usize {
        self.count(|call| *call == Call::Finalize)
    }

    /// Counts `process` calls.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.count(|call| matches!(call, Call::Process { .. }))
    }
}

/// Wraps a codec and records every call made to it.
#[derive(Debug)]
pub struct Recording<C> {
    inner: C,
    log: CallLog,
}

impl<C: Codec> Recording<C> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            log: CallLog::default(),
        }
    }

    /// Returns a handle on the recorded calls.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl<C: Codec> Codec for Recording<C> {
    fn expected_size(&self, input: Memory<'_>) -> usize {
        self.inner.expected_size(input)
    }

    fn min_out_size(&self, input: Memory<'_>) -> usize {
        self.inner.min_out_size(input)
    }

    fn initialize(&mut self) -> Result<(), CodecError> {
        self.log.push(Call::Initialize);
        self.inner.initialize()
    }

    fn finalize(&mut self) -> Result<(), CodecError> {
        self.log.push(Call::Finalize);
        self.inner.finalize()
    }

    fn start(&mut self, direction: Direction, error: &mut ErrorSlot) -> Status {
        self.log.push(Call::Start(direction));
        self.inner.start(direction, error)
    }

    fn process(
        &mut self,
        input: Memory<'_>,
        output: MemoryMut<'_>,
        error: &mut ErrorSlot,
    ) -> Processed {
        self.log.push(Call::Process {
            input: input.len(),
            output: output.len(),
        });
        self.inner.process(input, output, error)
    }

    fn is_passthrough(&self) -> bool {
        self.inner.is_passthrough()
    }
}

/// Read-only resource that returns at most `chunk` bytes per call.
#[derive(Debug)]
pub struct TrickleReader {
    data: Vec<u8>,
    position: usize,
    chunk: usize,
    reads: usize,
}

impl TrickleReader {
    /// Serves `data` in pieces of at most `chunk` bytes.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            position: 0,
            chunk: chunk.max(1),
            reads: 0,
        }
    }

    /// Returns how many reads were served, including the final empty one.
    #[must_use]
    pub const fn reads(&self) -> usize {
        self.reads
    }
}

impl Resource for TrickleReader {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let remaining = &self.data[self.position..];
        let n = remaining.len().min(buf.len()).min(self.chunk);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

/// Write-only resource that accepts at most `chunk` bytes per call.
///
/// With a capacity set, writes beyond it fail with
/// [`io::ErrorKind::StorageFull`].
#[derive(Debug, Default)]
pub struct BoundedWriter {
    data: Vec<u8>,
    chunk: usize,
    capacity: Option<usize>,
    fail_next: Option<io::ErrorKind>,
    flushes: usize,
    closed: bool,
}

impl BoundedWriter {
    /// Accepts `chunk` bytes per write without a total limit.
    #[must_use]
    pub fn new(chunk: usize) -> Self {
        Self {
            chunk: chunk.max(1),
            ..Self::default()
        }
    }

    /// Fails writes once `capacity` bytes were accepted.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Fails the next write with `kind`, then behaves normally again.
    #[must_use]
    pub const fn fail_once(mut self, kind: io::ErrorKind) -> Self {
        self.fail_next = Some(kind);
        self
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns how many times the writer was flushed.
    #[must_use]
    pub const fn flushes(&self) -> usize {
        self.flushes
    }

    /// Reports whether the writer was closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Resource for BoundedWriter {
    fn is_open(&self) -> bool {
        !self.closed
    }

    fn write_from(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.fail_next.take() {
            return Err(io::Error::new(kind, "injected write failure"));
        }
        let mut n = buf.len().min(self.chunk);
        if let Some(capacity) = self.capacity {
            let room = capacity.saturating_sub(self.data.len());
            if room == 0 && !buf.is_empty() {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "writer is full"));
            }
            n = n.min(room);
        }
        self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush_out(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Writes `contents` to a file inside a fresh temporary directory.
///
/// Keep the returned directory alive for as long as the file is needed.
///
/// # Panics
///
/// Panics when the temporary directory or file cannot be created.
#[must_use]
pub fn temp_file_with(contents: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("payload.bin");
    std::fs::write(&path, contents).expect("write temp file");
    (dir, path)
}
