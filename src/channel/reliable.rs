use crate::{ChannelError, Result};
use bytes::{Bytes, BytesMut};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// Upper bound on the bytes requested by a single read
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Outcome of the receive loop, before it is mapped onto a `ChannelError`
enum Fill {
    Complete,
    PeerClosed,
    Failed(std::io::Error),
}

/// Exchanges one message over a connected stream
///
/// The channel owns the stream for its whole lifetime. It is open until
/// [`close`](Self::close) is called, it is dropped, or a transport failure
/// occurs; after that every operation returns [`ChannelError::Closed`].
/// Both operations take `&mut self`, so only one can be in flight.
///
/// The reply length is supplied by the caller. Nothing on the wire
/// carries it: an echo peer answers with exactly as many bytes as it was
/// sent, so callers pass the request length.
///
/// # Examples
///
/// ```no_run
/// use echo6::ReliableEchoChannel;
/// use bytes::Bytes;
/// use std::time::Duration;
/// use tokio::net::TcpStream;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let stream = TcpStream::connect("[::1]:7").await?;
///     let mut channel = ReliableEchoChannel::new(stream);
///
///     let message = Bytes::from_static(b"Hello, Server!");
///     let expected = message.len();
///     channel.send_all(message).await?;
///     let reply = channel.receive_exact(expected, Some(Duration::from_secs(5))).await?;
///     assert_eq!(&reply[..], b"Hello, Server!");
///
///     channel.close().await;
///     Ok(())
/// }
/// ```
pub struct ReliableEchoChannel<S> {
    stream: Option<S>,
    chunk_size: usize,
}

impl<S> ReliableEchoChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream using [`DEFAULT_CHUNK_SIZE`]
    pub fn new(stream: S) -> Self {
        Self::with_chunk_size(stream, DEFAULT_CHUNK_SIZE)
    }

    /// Wraps a connected stream, bounding each read to `chunk_size` bytes
    ///
    /// A chunk size of zero is raised to one.
    pub fn with_chunk_size(stream: S, chunk_size: usize) -> Self {
        Self {
            stream: Some(stream),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Maximum number of bytes requested per read
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns true once the connection has been released
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Borrows the underlying stream while the channel is open
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Gives the underlying stream back, if the channel is still open
    pub fn into_inner(self) -> Option<S> {
        self.stream
    }

    /// Writes the whole payload, resuming after partial writes
    ///
    /// An empty payload is rejected before any write is issued. A write
    /// error, or a write that accepts no bytes, fails the send and closes
    /// the channel; the error records how many bytes had gone out.
    pub async fn send_all(&mut self, payload: Bytes) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ChannelError::Closed);
        };
        if payload.is_empty() {
            return Err(ChannelError::EmptyPayload);
        }

        match write_fully(stream, &payload).await {
            Ok(()) => {
                info!(bytes = payload.len(), "Sent payload");
                Ok(())
            }
            Err((bytes_sent, source)) => {
                warn!(bytes_sent, total = payload.len(), error = %source, "Send failed");
                self.release();
                Err(ChannelError::SendFailed { bytes_sent, source })
            }
        }
    }

    /// Reads exactly `expected` bytes, or fails
    ///
    /// Reads go into the unfilled tail of a buffer sized `expected`, each
    /// one capped at the chunk size, so nothing past the reply is ever
    /// requested. The deadline, when given, bounds the whole operation.
    ///
    /// A peer that closes early produces [`ChannelError::ShortRead`]
    /// carrying the bytes that did arrive. Every failure except
    /// [`ChannelError::InvalidLength`] closes the channel.
    pub async fn receive_exact(
        &mut self,
        expected: usize,
        deadline: Option<Duration>,
    ) -> Result<Bytes> {
        let chunk_size = self.chunk_size;
        let Some(stream) = self.stream.as_mut() else {
            return Err(ChannelError::Closed);
        };
        if expected == 0 {
            return Err(ChannelError::InvalidLength);
        }

        let mut buffer = BytesMut::zeroed(expected);
        let mut received = 0;
        // A deadline too far out to represent is no deadline at all.
        let until = deadline.and_then(|limit| Instant::now().checked_add(limit));
        let outcome = match until {
            Some(until) => timeout_at(until, fill(stream, &mut buffer, &mut received, chunk_size))
                .await
                .ok(),
            None => Some(fill(stream, &mut buffer, &mut received, chunk_size).await),
        };

        match outcome {
            Some(Fill::Complete) => {
                info!(bytes = expected, "Received reply");
                Ok(buffer.freeze())
            }
            Some(Fill::PeerClosed) => {
                warn!(received, expected, "Peer closed before full reply");
                self.release();
                buffer.truncate(received);
                Err(ChannelError::ShortRead {
                    received,
                    expected,
                    partial: buffer.freeze(),
                })
            }
            Some(Fill::Failed(source)) => {
                warn!(received, expected, error = %source, "Receive failed");
                self.release();
                Err(ChannelError::ReceiveFailed { received, source })
            }
            None => {
                warn!(received, expected, ?deadline, "Receive timed out");
                self.release();
                Err(ChannelError::Timeout { received, expected })
            }
        }
    }

    /// Shuts down the write half and releases the connection
    ///
    /// Calling this on a closed channel does nothing.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Shutdown on close failed");
            }
            debug!("Channel closed");
        }
    }

    fn release(&mut self) {
        // Dropping the stream closes the connection.
        self.stream = None;
    }
}

async fn write_fully<S>(stream: &mut S, payload: &[u8]) -> std::result::Result<(), (usize, std::io::Error)>
where
    S: AsyncWrite + Unpin,
{
    let mut sent = 0;
    while sent < payload.len() {
        match stream.write(&payload[sent..]).await {
            Ok(0) => {
                return Err((
                    sent,
                    std::io::Error::new(ErrorKind::WriteZero, "transport accepted no bytes"),
                ));
            }
            Ok(n) => {
                sent += n;
                debug!(fragment = n, sent, total = payload.len(), "Wrote fragment");
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err((sent, e)),
        }
    }
    stream.flush().await.map_err(|e| (sent, e))
}

async fn fill<S>(stream: &mut S, buffer: &mut [u8], received: &mut usize, chunk_size: usize) -> Fill
where
    S: AsyncRead + Unpin,
{
    let expected = buffer.len();
    while *received < expected {
        let end = *received + chunk_size.min(expected - *received);
        match stream.read(&mut buffer[*received..end]).await {
            Ok(0) => return Fill::PeerClosed,
            Ok(n) => {
                *received += n;
                debug!(fragment = n, received = *received, expected, "Received fragment");
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Fill::Failed(e),
        }
    }
    Fill::Complete
}
