//! src/logsink.rs
//!
//! The run log: membership joins and removals plus free-form debug lines,
//! appended to two text files for the lifetime of the process. The protocol
//! never reads these; they are a sink only, so nodes take them as an
//! injected trait and tests substitute [`MemoryLog`].

use crate::{domain::Address, error::Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Destination for membership events and debug lines. `observer` is the
/// node on whose behalf the line is written, `now` the local tick.
pub trait LogSink {
    /// Records that `observer` added `added` to its table.
    fn node_add(&mut self, observer: Address, added: Address, now: i64);
    /// Records that `observer` dropped `removed` from its table.
    fn node_remove(&mut self, observer: Address, removed: Address, now: i64);
    /// Free-form debug line attributed to `observer`.
    fn debug(&mut self, observer: Address, now: i64, message: &str);
}

/// Flush the file buffers after this many writes.
const FLUSH_EVERY: usize = 256;

/// File-backed sink writing the two append-only run logs: a debug log with
/// every membership event, and a stats log for end-of-run summary lines.
/// The file handles live for the whole run; [`Drop`] flushes what remains.
pub struct EventLog {
    dbg: BufWriter<File>,
    stats: BufWriter<File>,
    writes: usize,
}

impl EventLog {
    pub fn create(dbg_path: &Path, stats_path: &Path) -> Result<Self> {
        Ok(Self {
            dbg: BufWriter::new(File::create(dbg_path)?),
            stats: BufWriter::new(File::create(stats_path)?),
            writes: 0,
        })
    }

    /// Appends one line to the stats log.
    pub fn stat(&mut self, observer: Address, now: i64, message: &str) {
        // The sink is best-effort; a full disk must not stop the run.
        let _ = writeln!(self.stats, " {observer} [{now}] {message}");
        self.flush_every_so_often();
    }

    fn write_dbg(&mut self, observer: Address, now: i64, message: &str) {
        let _ = writeln!(self.dbg, " {observer} [{now}] {message}");
        self.flush_every_so_often();
    }

    fn flush_every_so_often(&mut self) {
        self.writes += 1;
        if self.writes >= FLUSH_EVERY {
            let _ = self.dbg.flush();
            let _ = self.stats.flush();
            self.writes = 0;
        }
    }
}

impl LogSink for EventLog {
    fn node_add(&mut self, observer: Address, added: Address, now: i64) {
        tracing::debug!(observer = %observer, added = %added, tick = now, "Node added");
        self.write_dbg(observer, now, &format!("Node {added} joined at time {now}"));
    }

    fn node_remove(&mut self, observer: Address, removed: Address, now: i64) {
        tracing::debug!(observer = %observer, removed = %removed, tick = now, "Node removed");
        self.write_dbg(observer, now, &format!("Node {removed} removed at time {now}"));
    }

    fn debug(&mut self, observer: Address, now: i64, message: &str) {
        self.write_dbg(observer, now, message);
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        let _ = self.dbg.flush();
        let _ = self.stats.flush();
    }
}

/// A membership event captured by [`MemoryLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Add {
        observer: Address,
        member: Address,
        tick: i64,
    },
    Remove {
        observer: Address,
        member: Address,
        tick: i64,
    },
}

/// In-memory sink for tests: captures membership events in order and
/// discards debug chatter.
#[derive(Debug, Default)]
pub struct MemoryLog {
    pub events: Vec<LogEvent>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses the given node has logged as removed, in order.
    pub fn removals_seen_by(&self, observer: Address) -> Vec<Address> {
        self.events
            .iter()
            .filter_map(|event| match event {
                LogEvent::Remove {
                    observer: seen_by,
                    member,
                    ..
                } if *seen_by == observer => Some(*member),
                _ => None,
            })
            .collect()
    }
}

impl LogSink for MemoryLog {
    fn node_add(&mut self, observer: Address, added: Address, now: i64) {
        self.events.push(LogEvent::Add {
            observer,
            member: added,
            tick: now,
        });
    }

    fn node_remove(&mut self, observer: Address, removed: Address, now: i64) {
        self.events.push(LogEvent::Remove {
            observer,
            member: removed,
            tick: now,
        });
    }

    fn debug(&mut self, _observer: Address, _now: i64, _message: &str) {}
}

// --- Unit Tests ---
