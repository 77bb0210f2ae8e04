//! One-shot echo client over TCP
//!
//! This module is the library half of the `echo6` binary: it turns a
//! server address into a connected channel and drives a single exchange.

pub mod address;
pub mod config;
pub mod session;

pub use address::ServerAddress;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use session::EchoClient;

use crate::ChannelError;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Error types for the echo client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server address or port could not be used
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    /// An IPv4 server was given while IPv4 is disabled
    #[error("connect: {0} is an IPv4 address and IPv4 is not enabled")]
    Ipv4NotAllowed(SocketAddr),

    /// The TCP connection could not be established
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The TCP connection was not established in time
    #[error("connect to {addr} timed out after {after:?}")]
    ConnectTimeout { addr: SocketAddr, after: Duration },

    /// The exchange itself failed
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The reply was not valid UTF-8
    #[error("reply is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;
