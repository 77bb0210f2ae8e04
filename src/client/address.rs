use super::{ClientError, ClientResult};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Address of the echo server
///
/// The host must be an IP literal; no name resolution is done. IPv6
/// literals may be written with or without brackets.
///
/// # Examples
///
/// ```
/// use echo6::ServerAddress;
///
/// let addr = ServerAddress::parse("::1", 7).unwrap();
/// assert!(addr.is_ipv6());
/// assert_eq!(addr.to_string(), "[::1]:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerAddress(SocketAddr);

impl ServerAddress {
    /// Builds an address from an IP literal and a port
    pub fn parse(host: &str, port: u16) -> ClientResult<Self> {
        if port == 0 {
            return Err(ClientError::InvalidAddress("port must be non-zero".to_string()));
        }
        let literal = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let ip: IpAddr = literal
            .parse()
            .map_err(|e| ClientError::InvalidAddress(format!("{host}: {e}")))?;
        Ok(Self(SocketAddr::new(ip, port)))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.0
    }

    pub fn is_ipv6(&self) -> bool {
        self.0.is_ipv6()
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SocketAddr> for ServerAddress {
    fn from(addr: SocketAddr) -> Self {
        ServerAddress(addr)
    }
}

impl FromStr for ServerAddress {
    type Err = ClientError;

    /// Parses a full socket address such as `[::1]:7`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr: SocketAddr = s
            .parse()
            .map_err(|e| ClientError::InvalidAddress(format!("{s}: {e}")))?;
        if addr.port() == 0 {
            return Err(ClientError::InvalidAddress("port must be non-zero".to_string()));
        }
        Ok(Self(addr))
    }
}
