use bytes::Bytes;
use thiserror::Error;

/// Error types for a reliable echo channel
///
/// Transport failures (`SendFailed`, `ReceiveFailed`, `Timeout`,
/// `ShortRead`) are terminal: the connection is closed before the error is
/// returned. `EmptyPayload` and `InvalidLength` are rejected up front and
/// leave the channel open.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The caller tried to send a zero-length message
    #[error("send: empty payload")]
    EmptyPayload,

    /// A receive was requested for zero bytes
    #[error("receive: expected length must be greater than zero")]
    InvalidLength,

    /// The transport failed or stalled part way through a write
    #[error("send failed after {bytes_sent} bytes: {source}")]
    SendFailed {
        bytes_sent: usize,
        #[source]
        source: std::io::Error,
    },

    /// The transport reported a read error
    #[error("receive failed after {received} bytes: {source}")]
    ReceiveFailed {
        received: usize,
        #[source]
        source: std::io::Error,
    },

    /// The deadline passed before the full reply arrived
    #[error("receive timed out: got {received} of {expected} bytes")]
    Timeout { received: usize, expected: usize },

    /// The peer closed the connection before the full reply arrived
    #[error("receive: peer closed connection after {received} of {expected} bytes")]
    ShortRead {
        received: usize,
        expected: usize,
        /// Whatever the peer delivered before closing
        partial: Bytes,
    },

    /// The channel was already closed
    #[error("channel is closed")]
    Closed,
}

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;

pub mod channel;
pub mod client;
pub mod mock;

// Re-export main types for convenience
pub use channel::{DEFAULT_CHUNK_SIZE, ReliableEchoChannel};
pub use client::{ClientConfig, ClientConfigBuilder, ClientError, EchoClient, ServerAddress};
