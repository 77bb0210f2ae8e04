//! Reliable message exchange over a byte-stream transport
//!
//! This module provides the channel that sends a payload in full across
//! partial writes and reassembles a reply of known length from however
//! many fragments the transport delivers it in.

pub mod reliable;

pub use reliable::{DEFAULT_CHUNK_SIZE, ReliableEchoChannel};
