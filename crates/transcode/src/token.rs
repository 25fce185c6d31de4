//! In-band control tokens for writers.

use crate::codec::Codec;
use crate::error::Error;
use crate::resource::Resource;
use crate::stream::TranscodingStream;

/// Marker asking a writing stream to end the current block.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct EndToken;

/// The end-of-block token.
///
/// ```
/// use transcode::{NoopStream, Noop, TOKEN_END};
///
/// let mut stream = NoopStream::new(Noop, Vec::new())?;
/// stream.try_write(b"block")?;
/// stream.write_token(TOKEN_END)?;
/// # Ok::<(), transcode::Error>(())
/// ```
pub const TOKEN_END: EndToken = EndToken;

impl<C: Codec, S: Resource> TranscodingStream<C, S> {
    /// Writes a control token; see [`TranscodingStream::write_end`].
    ///
    /// # Errors
    ///
    /// Same as [`TranscodingStream::write_end`].
    pub fn write_token(&mut self, token: EndToken) -> Result<(), Error> {
        let EndToken = token;
        self.write_end()
    }
}
