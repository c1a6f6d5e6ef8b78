//! src/codec.rs
//!
//! Wire framing for the three membership protocol messages. A frame is a
//! contiguous byte buffer: a one-byte type tag followed by a type-specific
//! payload. The membership digest carried by JOINREP and GOSSIP keeps the
//! legacy ASCII form (`"<id>.<port>.<heartbeat>.<timestamp>"` records
//! terminated by `>`) so run logs stay comparable across implementations.
//!
//! Decoding is fully bounds-checked and never panics on malformed input;
//! everything that does not parse maps to a [`CodecError`].

use crate::{
    domain::{Address, MemberEntry, ADDR_LEN},
    error::CodecError,
};

const TAG_JOINREQ: u8 = 0;
const TAG_JOINREP: u8 = 1;
const TAG_GOSSIP: u8 = 2;

/// Separator and terminator between digest records.
const RECORD_DELIMITER: char = '>';

/// Total length of a JOINREQ frame: tag, address, one reserved pad byte,
/// and a little-endian signed heartbeat.
const JOINREQ_LEN: usize = 1 + ADDR_LEN + 1 + 8;

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A newcomer announcing itself to the introducer.
    JoinReq { from: Address, heartbeat: i64 },
    /// The introducer's full table, admitting the newcomer.
    JoinRep { digest: Vec<MemberEntry> },
    /// A periodic membership digest.
    Gossip { digest: Vec<MemberEntry> },
}

pub fn encode_join_req(from: Address, heartbeat: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(JOINREQ_LEN);
    buf.push(TAG_JOINREQ);
    buf.extend_from_slice(&from.to_bytes());
    // Reserved pad byte, kept zero on the wire.
    buf.push(0);
    buf.extend_from_slice(&heartbeat.to_le_bytes());
    buf
}

pub fn encode_join_rep(table: &[MemberEntry]) -> Vec<u8> {
    let mut buf = vec![TAG_JOINREP];
    write_digest(&mut buf, table);
    buf
}

pub fn encode_gossip(table: &[MemberEntry]) -> Vec<u8> {
    let mut buf = vec![TAG_GOSSIP];
    write_digest(&mut buf, table);
    buf.push(0); // NUL terminator
    buf
}

/// Decodes a single frame.
pub fn decode(buf: &[u8]) -> Result<Frame, CodecError> {
    let (&tag, payload) = buf.split_first().ok_or(CodecError::Truncated {
        expected: 1,
        got: 0,
    })?;
    match tag {
        TAG_JOINREQ => decode_join_req(payload),
        TAG_JOINREP => Ok(Frame::JoinRep {
            digest: parse_digest(payload)?,
        }),
        TAG_GOSSIP => Ok(Frame::Gossip {
            digest: parse_digest(payload)?,
        }),
        other => Err(CodecError::BadTag(other)),
    }
}

fn decode_join_req(payload: &[u8]) -> Result<Frame, CodecError> {
    if payload.len() < JOINREQ_LEN - 1 {
        return Err(CodecError::Truncated {
            expected: JOINREQ_LEN,
            got: payload.len() + 1,
        });
    }
    let mut addr = [0u8; ADDR_LEN];
    addr.copy_from_slice(&payload[..ADDR_LEN]);
    // payload[ADDR_LEN] is the reserved pad byte; its value is ignored.
    let mut heartbeat = [0u8; 8];
    heartbeat.copy_from_slice(&payload[ADDR_LEN + 1..ADDR_LEN + 9]);
    Ok(Frame::JoinReq {
        from: Address::from_bytes(addr),
        heartbeat: i64::from_le_bytes(heartbeat),
    })
}

fn write_digest(buf: &mut Vec<u8>, table: &[MemberEntry]) {
    for entry in table {
        let record = format!(
            "{}.{}.{}.{}{}",
            entry.id, entry.port, entry.heartbeat, entry.timestamp, RECORD_DELIMITER
        );
        buf.extend_from_slice(record.as_bytes());
    }
}

fn parse_digest(payload: &[u8]) -> Result<Vec<MemberEntry>, CodecError> {
    // Tolerate trailing NULs: the gossip frame is NUL-terminated.
    let mut end = payload.len();
    while end > 0 && payload[end - 1] == 0 {
        end -= 1;
    }
    let text = std::str::from_utf8(&payload[..end])
        .map_err(|_| CodecError::BadField(String::from_utf8_lossy(&payload[..end]).into_owned()))?;

    let mut records = Vec::new();
    for raw in text.split(RECORD_DELIMITER) {
        // The delimiter also terminates the final record, leaving one
        // empty trailing piece.
        if raw.is_empty() {
            continue;
        }
        records.push(parse_record(raw)?);
    }
    Ok(records)
}

fn parse_record(raw: &str) -> Result<MemberEntry, CodecError> {
    let bad = || CodecError::BadField(raw.to_owned());
    let mut fields = raw.split('.');
    let id = fields
        .next()
        .and_then(|f| f.parse::<u32>().ok())
        .ok_or_else(bad)?;
    let port = fields
        .next()
        .and_then(|f| f.parse::<u16>().ok())
        .ok_or_else(bad)?;
    let heartbeat = fields
        .next()
        .and_then(|f| f.parse::<i64>().ok())
        .ok_or_else(bad)?;
    let timestamp = fields
        .next()
        .and_then(|f| f.parse::<i64>().ok())
        .ok_or_else(bad)?;
    if fields.next().is_some() {
        return Err(bad());
    }
    Ok(MemberEntry::new(id, port, heartbeat, timestamp))
}

// --- Unit Tests ---
