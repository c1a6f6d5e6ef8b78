//! src/engine/protocol.rs
//!
//! Pure protocol rules, isolated from I/O so they can be analyzed and
//! tested on their own: the digest merge rule and gossip target selection.

use super::table::MemberTable;
use crate::domain::{Address, MemberEntry};

/// What applying one digest record to the table did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Previously unknown peer, inserted fresh.
    Added,
    /// Known peer whose heartbeat advanced; its staleness clock restarts.
    Refreshed,
    /// Stale or duplicate information, or our own record.
    Ignored,
}

/// Applies one incoming digest record to the table.
///
/// The record's own timestamp is informational only: a freshly learned or
/// refreshed peer is stamped with the local `now`, so failure detection
/// always measures local staleness. A record for ourselves is a no-op; the
/// self row's heartbeat is driven solely by the local tick operator.
pub fn merge_record(
    table: &mut MemberTable,
    self_id: u32,
    record: &MemberEntry,
    now: i64,
) -> MergeOutcome {
    if record.id == self_id {
        return MergeOutcome::Ignored;
    }
    if table.find(record.id).is_none() {
        table.insert(MemberEntry::new(
            record.id,
            record.port,
            record.heartbeat,
            now,
        ));
        return MergeOutcome::Added;
    }
    if table.update_heartbeat(record.id, record.heartbeat, now) {
        MergeOutcome::Refreshed
    } else {
        MergeOutcome::Ignored
    }
}

/// Snapshot of everyone to gossip to: every peer in the table except self,
/// in table iteration order.
pub fn gossip_targets(table: &MemberTable, self_id: u32) -> Vec<Address> {
    table
        .iter()
        .filter(|e| e.id != self_id)
        .map(|e| e.addr())
        .collect()
}

// --- Unit Tests ---
