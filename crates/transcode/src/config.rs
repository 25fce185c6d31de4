//! Construction parameters for transcoding streams.

/// Default size, in bytes, of each stream buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Options fixed when a [`TranscodingStream`](crate::TranscodingStream) is built.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamConfig {
    /// Initial capacity of each buffer owned by the stream.
    pub buffer_size: usize,
    /// Borrow the near buffer of a wrapped transcoding stream instead of
    /// allocating a far buffer.
    pub share_buffers: bool,
    /// Restart the codec when it reports the end of a member but more input
    /// follows, decoding concatenated members as one stream.
    pub concatenated: bool,
}

impl StreamConfig {
    /// Returns the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            share_buffers: true,
            concatenated: false,
        }
    }

    /// Sets the buffer size.
    pub const fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Enables or disables buffer sharing with a wrapped transcoding stream.
    pub const fn share_buffers(mut self, share: bool) -> Self {
        self.share_buffers = share;
        self
    }

    /// Enables or disables decoding of concatenated members.
    pub const fn concatenated(mut self, concatenated: bool) -> Self {
        self.concatenated = concatenated;
        self
    }

    /// Checks that the configuration can drive a stream.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned when a [`StreamConfig`] is rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Buffers must be able to hold at least one byte.
    #[error("buffer size must be greater than zero")]
    ZeroBufferSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = StreamConfig::default();
        assert_eq!(config.buffer_size, 16384);
        assert!(config.share_buffers);
        assert!(!config.concatenated);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_setters_chain() {
        let config = StreamConfig::new()
            .buffer_size(2)
            .share_buffers(false)
            .concatenated(true);
        assert_eq!(config.buffer_size, 2);
        assert!(!config.share_buffers);
        assert!(config.concatenated);
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        let err = StreamConfig::new()
            .buffer_size(0)
            .validate()
            .expect_err("zero-sized buffers rejected");
        assert_eq!(err, ConfigError::ZeroBufferSize);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_documents_with_defaults() {
        let config: StreamConfig =
            serde_json::from_str(r#"{"buffer_size": 512}"#).expect("valid config");
        assert_eq!(config.buffer_size, 512);
        assert!(config.share_buffers);
    }
}
