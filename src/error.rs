//! src/error.rs
//!
//! Defines the library's custom `Error` enum using `thiserror`, plus the
//! narrower per-frame and per-send error types. Only `Error` ever crosses
//! an API boundary; codec and send failures are logged and dropped inside
//! the tick so one bad peer cannot take a node down.

use crate::domain::Address;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot start a node on the null address")]
    NullAddress,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Per-frame decode failure. Never propagated past the receive handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Frame truncated: expected at least {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("Unknown message tag {0:#04x}")]
    BadTag(u8),

    #[error("Malformed digest field in record {0:?}")]
    BadField(String),
}

/// Failure reported by the network adapter. Gossip is best-effort, so
/// senders log these and move on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Destination {0} is not attached to the network")]
    UnknownDestination(Address),

    #[error("Frame of {0} bytes exceeds the {1}-byte limit")]
    Oversize(usize, usize),
}
