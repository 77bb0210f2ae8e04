use super::{ClientConfig, ClientError, ClientResult, ServerAddress};
use crate::channel::ReliableEchoChannel;
use bytes::Bytes;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::info;

/// TCP echo client good for exactly one exchange
///
/// # Examples
///
/// ```no_run
/// use echo6::{EchoClient, ServerAddress};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let addr = ServerAddress::parse("::1", 7)?;
///     let client = EchoClient::connect(addr).await?;
///
///     let response = client.echo_string("Hello, Server!").await?;
///     println!("Server echoed: {}", response);
///     Ok(())
/// }
/// ```
pub struct EchoClient {
    channel: ReliableEchoChannel<TcpStream>,
    config: ClientConfig,
    peer: SocketAddr,
}

impl EchoClient {
    /// Connects with the default configuration
    pub async fn connect<A: Into<ServerAddress>>(address: A) -> ClientResult<Self> {
        Self::connect_with_config(address, ClientConfig::default()).await
    }

    /// Connects to the server within the configured connect timeout
    pub async fn connect_with_config<A: Into<ServerAddress>>(
        address: A,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let addr = address.into().socket_addr();
        if addr.is_ipv4() && !config.allow_ipv4 {
            return Err(ClientError::Ipv4NotAllowed(addr));
        }

        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::ConnectTimeout {
                addr,
                after: config.connect_timeout,
            })?
            .map_err(|source| ClientError::Connect { addr, source })?;
        info!(%addr, "Connected to echo server");

        Ok(Self {
            channel: ReliableEchoChannel::with_chunk_size(stream, config.chunk_size),
            config,
            peer: addr,
        })
    }

    /// Address of the connected echo server
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Get client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends the payload and returns the echoed reply
    ///
    /// The reply is expected to be exactly as long as the payload. The
    /// connection is closed afterwards whether or not the exchange worked.
    pub async fn echo<B: Into<Bytes>>(mut self, payload: B) -> ClientResult<Bytes> {
        let payload = payload.into();
        let result = self.exchange(payload).await;
        self.channel.close().await;
        result
    }

    /// Sends a string and returns the echoed string
    pub async fn echo_string(self, message: &str) -> ClientResult<String> {
        let reply = self.echo(Bytes::copy_from_slice(message.as_bytes())).await?;
        Ok(String::from_utf8(reply.to_vec())?)
    }

    async fn exchange(&mut self, payload: Bytes) -> ClientResult<Bytes> {
        let expected = payload.len();
        self.channel.send_all(payload).await?;
        let reply = self
            .channel
            .receive_exact(expected, self.config.read_timeout)
            .await?;
        info!(peer = %self.peer, bytes = reply.len(), "Echo complete");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelError;
    use crate::client::ClientConfigBuilder;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_ipv4_rejected_unless_enabled() {
        let addr = ServerAddress::parse("127.0.0.1", 9).unwrap();
        let err = EchoClient::connect(addr).await.err().unwrap();
        assert!(matches!(err, ClientError::Ipv4NotAllowed(_)));
    }

    #[tokio::test]
    async fn test_echo_against_loopback_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let peer = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = [0u8; 64];
            let n = socket.read(&mut buffer).await.unwrap();
            socket.write_all(&buffer[..n]).await.unwrap();
        });

        let config = ClientConfigBuilder::new().allow_ipv4(true).build();
        let client = EchoClient::connect_with_config(addr, config).await.unwrap();
        assert_eq!(client.peer_addr(), addr);
        assert!(client.config().allow_ipv4);

        let reply = client.echo_string("ping").await.unwrap();
        assert_eq!(reply, "ping");
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_message_rejected_after_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = ClientConfigBuilder::new().allow_ipv4(true).build();
        let client = EchoClient::connect_with_config(addr, config).await.unwrap();
        let err = client.echo(Bytes::new()).await.unwrap_err();

        assert!(matches!(err, ClientError::Channel(ChannelError::EmptyPayload)));
    }
}
