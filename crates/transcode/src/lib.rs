#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `transcode` wraps a byte [`Resource`] (a file, a socket, an in-memory
//! buffer or another stream) and applies a pluggable incremental [`Codec`]
//! to every byte that passes through, in either read or write direction.
//! The payload is never materialised as a whole; bytes travel through two
//! bounded buffers that grow only when a codec needs more room.
//!
//! # Design
//!
//! - [`TranscodingStream`] owns the codec, the resource and a mutable state.
//!   A single mode machine decides which operations are legal.
//! - Codecs implement [`Codec`]: an optional `initialize`/`finalize` pair,
//!   a `start` per direction and a `process` step that reports consumed and
//!   produced byte counts together with a [`Status`]. Failures are stored in
//!   an [`ErrorSlot`] rather than unwound through the engine.
//! - Pass-through codecs such as [`Noop`] collapse the buffer pair into one
//!   buffer. Chained streams lend their near buffer to the stream wrapping
//!   them instead of copying bytes between two buffers.
//! - [`transcode()`] and [`Transcoder`] run a codec over a whole slice.
//!
//! # Invariants
//!
//! - Unread bytes are never dropped when a buffer grows or compacts.
//! - A codec is finalized at most once, and never after a failed `initialize`.
//! - After a codec failure the stream is [`Mode::Panicked`]; every operation
//!   except `close` and `is_open` reports [`Error::Broken`].
//!
//! # Errors
//!
//! Typed operations return [`Error`]. The [`std::io`] trait implementations
//! wrap it in [`std::io::Error`]; [`Error::from_io`] recovers the original.
//!
//! # Examples
//!
//! Reading through a pass-through stream with a tiny buffer:
//!
//! ```
//! use transcode::{Noop, NoopStream, StreamConfig};
//!
//! let config = StreamConfig::new().buffer_size(2);
//! let mut stream = NoopStream::with_config(Noop, &[10u8, 20, 30, 40][..], config)?;
//! let mut first = [0u8; 3];
//! assert_eq!(stream.read_up_to(&mut first)?, 3);
//! assert_eq!(first, [10, 20, 30]);
//! stream.close()?;
//! # Ok::<(), transcode::Error>(())
//! ```
//!
//! # Logging
//!
//! With the default `tracing` feature, mode transitions are emitted at
//! `debug` and codec steps at `trace` under the `transcode::stream` target.

mod buffer;
mod codec;
mod config;
mod error;
mod memory;
mod noop;
mod oneshot;
mod progress;
mod resource;
mod state;
mod stream;
mod token;
mod trace;

pub use buffer::Buffer;
pub use codec::{Codec, Direction, Processed, Status};
pub use config::{ConfigError, DEFAULT_BUFFER_SIZE, StreamConfig};
pub use error::{CodecError, Error, ErrorSlot};
pub use memory::{Memory, MemoryMut};
pub use noop::{Noop, NoopStream};
pub use oneshot::{Transcoder, transcode};
pub use resource::{Chained, ReadResource, Resource, WriteResource};
pub use state::{Mode, Stats};
pub use stream::TranscodingStream;
pub use token::{EndToken, TOKEN_END};
