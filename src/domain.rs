//! src/domain.rs
//!
//! Core domain types shared across the crate: node addresses and membership
//! table entries. This module is the single source of truth for how peers
//! are identified on the wire and in the liveness table.

use serde::Serialize;
use std::fmt;

/// Length of the wire representation of an [`Address`], in bytes.
pub const ADDR_LEN: usize = 6;

/// A node address: a 32-bit identifier plus a 16-bit port, laid out as six
/// little-endian bytes on the wire (id first, then port). Two addresses are
/// equal iff their six bytes match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub id: u32,
    pub port: u16,
}

impl Address {
    /// The sentinel "no address" value, `00:00:00:00:00:00` on the wire.
    pub const NULL: Address = Address { id: 0, port: 0 };

    /// The well-known introducer address. Every node in a run must agree
    /// on it.
    pub const INTRODUCER: Address = Address { id: 1, port: 0 };

    pub fn new(id: u32, port: u16) -> Self {
        Self { id, port }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Serializes to the 6-byte wire layout.
    pub fn to_bytes(self) -> [u8; ADDR_LEN] {
        let mut buf = [0u8; ADDR_LEN];
        buf[..4].copy_from_slice(&self.id.to_le_bytes());
        buf[4..].copy_from_slice(&self.port.to_le_bytes());
        buf
    }

    /// Reads the 6-byte wire layout back.
    pub fn from_bytes(buf: [u8; ADDR_LEN]) -> Self {
        let id = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let port = u16::from_le_bytes([buf[4], buf[5]]);
        Self { id, port }
    }
}

impl fmt::Display for Address {
    /// Renders the raw byte form, `a.b.c.d:port`, which is the address
    /// format used throughout the run logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.to_bytes();
        write!(f, "{}.{}.{}.{}:{}", b[0], b[1], b[2], b[3], self.port)
    }
}

/// One row of the membership table: the latest heartbeat a peer has reported
/// about itself, and the local tick at which this node last refreshed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MemberEntry {
    pub id: u32,
    pub port: u16,
    pub heartbeat: i64,
    /// Local tick of the last refresh. Never the peer's own clock, so
    /// failure detection measures local staleness only.
    pub timestamp: i64,
}

impl MemberEntry {
    pub fn new(id: u32, port: u16, heartbeat: i64, timestamp: i64) -> Self {
        Self {
            id,
            port,
            heartbeat,
            timestamp,
        }
    }

    pub fn addr(&self) -> Address {
        Address::new(self.id, self.port)
    }
}

// --- Unit Tests ---
