use crate::channel::DEFAULT_CHUNK_SIZE;
use std::time::Duration;

/// Configuration for the echo client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Time allowed for the TCP connection to be established
    pub connect_timeout: Duration,
    /// Deadline for the whole reply to arrive (None waits indefinitely)
    pub read_timeout: Option<Duration>,
    /// Maximum number of bytes requested per read
    pub chunk_size: usize,
    /// Accept IPv4 server addresses as well as IPv6
    pub allow_ipv4: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Some(Duration::from_secs(30)),
            chunk_size: DEFAULT_CHUNK_SIZE,
            allow_ipv4: false,
        }
    }
}

/// Builder for client configuration
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Sets the per-read limit; zero is raised to one
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size.max(1);
        self
    }

    pub fn allow_ipv4(mut self, allow: bool) -> Self {
        self.config.allow_ipv4 = allow;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.chunk_size, 500);
        assert!(!config.allow_ipv4);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfigBuilder::new()
            .connect_timeout(Duration::from_millis(250))
            .read_timeout(None)
            .chunk_size(0)
            .allow_ipv4(true)
            .build();

        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.chunk_size, 1);
        assert!(config.allow_ipv4);
    }
}
