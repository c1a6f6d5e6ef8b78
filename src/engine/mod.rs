//! src/engine/mod.rs
//!
//! The membership state machine run by each node: join bootstrapping, the
//! liveness table, the gossip round, and failure detection. The emulator
//! drives a node by calling [`Node::tick`] exactly once per logical time
//! unit; nothing in here blocks, suspends, or yields, and a tick always
//! runs to completion before the next begins.

pub mod protocol;
pub mod table;

use crate::{
    codec::{self, Frame},
    domain::{Address, MemberEntry},
    emulnet::Network,
    error::{Error, Result},
    logsink::LogSink,
};
use self::protocol::MergeOutcome;
use self::table::MemberTable;
use std::collections::VecDeque;

/// Protocol timing constants, in ticks.
#[derive(Debug, Clone, Copy)]
pub struct Timers {
    /// Ticks of silence after which a peer counts as failed.
    pub t_fail: i64,
    /// Ticks of silence after which a peer is dropped from the table.
    pub t_remove: i64,
    /// Ticks between gossip rounds.
    pub t_gossip: i64,
}

impl Default for Timers {
    fn default() -> Self {
        Self {
            t_fail: 5,
            t_remove: 20,
            t_gossip: 5,
        }
    }
}

/// A single membership protocol node.
///
/// Lifecycle: created uninitialized, [`Node::start`] seeds the table with
/// the node's own row and reaches out to the introducer, then the emulator
/// ticks it until it is stopped or crashed with [`Node::fail`].
pub struct Node {
    addr: Address,
    timers: Timers,
    inited: bool,
    in_group: bool,
    failed: bool,
    /// Local heartbeat counter, incremented once per tick while in-group.
    heartbeat: i64,
    /// Ticks remaining until the next gossip round.
    ping_counter: i64,
    inbox: VecDeque<Vec<u8>>,
    table: MemberTable,
}

impl Node {
    /// Creates an uninitialized node. Call [`Node::start`] before ticking.
    pub fn new(addr: Address, timers: Timers) -> Self {
        Self {
            addr,
            timers,
            inited: false,
            in_group: false,
            failed: false,
            heartbeat: 0,
            ping_counter: 0,
            inbox: VecDeque::new(),
            table: MemberTable::new(),
        }
    }

    pub fn addr(&self) -> Address {
        self.addr
    }

    pub fn is_in_group(&self) -> bool {
        self.in_group
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn heartbeat(&self) -> i64 {
        self.heartbeat
    }

    pub fn table(&self) -> &MemberTable {
        &self.table
    }

    /// Bootstraps the node: resets all protocol state, seeds the table with
    /// the node's own row, and announces itself to the introducer.
    ///
    /// Fails only when the node's own address is the null sentinel.
    pub fn start(
        &mut self,
        introducer: Address,
        now: i64,
        net: &mut dyn Network,
        log: &mut dyn LogSink,
    ) -> Result<()> {
        if self.addr.is_null() {
            return Err(Error::NullAddress);
        }
        self.failed = false;
        self.inited = true;
        self.in_group = false;
        self.heartbeat = 0;
        self.ping_counter = self.timers.t_fail;
        self.inbox.clear();
        self.table.clear();
        self.table.insert(MemberEntry::new(
            self.addr.id,
            self.addr.port,
            self.heartbeat,
            now,
        ));
        log.node_add(self.addr, self.addr, now);
        self.introduce_self(introducer, now, net, log);
        Ok(())
    }

    /// Announces this node to the group. The group booter admits itself;
    /// everyone else fires a JOINREQ at the introducer and keeps ticking
    /// until the JOINREP arrives.
    fn introduce_self(
        &mut self,
        introducer: Address,
        now: i64,
        net: &mut dyn Network,
        log: &mut dyn LogSink,
    ) {
        if self.addr == introducer {
            log.debug(self.addr, now, "starting up group");
            self.in_group = true;
            return;
        }
        log.debug(self.addr, now, "trying to join");
        let frame = codec::encode_join_req(self.addr, self.heartbeat);
        self.send(introducer, &frame, now, net, log);
    }

    /// Tears down all protocol state. Safe to call more than once.
    pub fn stop(&mut self) {
        self.inited = false;
        self.in_group = false;
        self.heartbeat = 0;
        self.ping_counter = 0;
        self.inbox.clear();
        self.table.clear();
    }

    /// Marks the node crashed. A failed node neither receives nor sends;
    /// its peers prune it once its heartbeat goes stale.
    pub fn fail(&mut self) {
        self.failed = true;
    }

    /// Accepts one raw frame from the network layer.
    pub fn enqueue(&mut self, frame: Vec<u8>) {
        self.inbox.push_back(frame);
    }

    /// Runs one logical time step: drain the inbox in FIFO order, then,
    /// once admitted to the group, run the periodic membership duties.
    pub fn tick(&mut self, now: i64, net: &mut dyn Network, log: &mut dyn LogSink) {
        if self.failed || !self.inited {
            return;
        }
        self.drain_inbox(now, net, log);
        if self.in_group {
            self.periodic_ops(now, net, log);
        }
    }

    fn drain_inbox(&mut self, now: i64, net: &mut dyn Network, log: &mut dyn LogSink) {
        while let Some(raw) = self.inbox.pop_front() {
            match codec::decode(&raw) {
                Ok(frame) => self.handle_frame(frame, now, net, log),
                Err(err) => {
                    // A malformed frame from one peer must not take the
                    // node down; drop it and keep draining.
                    tracing::debug!(addr = %self.addr, error = %err, "Dropping undecodable frame");
                    log.debug(self.addr, now, &format!("dropped undecodable frame: {err}"));
                }
            }
        }
    }

    fn handle_frame(
        &mut self,
        frame: Frame,
        now: i64,
        net: &mut dyn Network,
        log: &mut dyn LogSink,
    ) {
        match frame {
            Frame::JoinReq { from, heartbeat } => {
                self.handle_join_req(from, heartbeat, now, net, log)
            }
            Frame::JoinRep { digest } => {
                self.in_group = true;
                self.merge_digest(&digest, now, log);
            }
            Frame::Gossip { digest } => self.merge_digest(&digest, now, log),
        }
    }

    /// Admits a newcomer and answers with the full table. The newcomer is
    /// inserted first so the reply digest already contains it.
    fn handle_join_req(
        &mut self,
        from: Address,
        heartbeat: i64,
        now: i64,
        net: &mut dyn Network,
        log: &mut dyn LogSink,
    ) {
        if self.table.find(from.id).is_none() {
            self.table
                .insert(MemberEntry::new(from.id, from.port, heartbeat, now));
            log.node_add(self.addr, from, now);
        }
        let reply = codec::encode_join_rep(self.table.entries());
        self.send(from, &reply, now, net, log);
    }

    fn merge_digest(&mut self, digest: &[MemberEntry], now: i64, log: &mut dyn LogSink) {
        for record in digest {
            let outcome = protocol::merge_record(&mut self.table, self.addr.id, record, now);
            if outcome == MergeOutcome::Added {
                log.node_add(self.addr, record.addr(), now);
            }
        }
    }

    /// The per-tick membership duties: heartbeat ourselves, prune the dead,
    /// and every `t_gossip` ticks share the table with everyone we know.
    ///
    /// The self-heartbeat bump comes first so outgoing gossip always carries
    /// the freshest value and the node can never prune itself.
    fn periodic_ops(&mut self, now: i64, net: &mut dyn Network, log: &mut dyn LogSink) {
        self.heartbeat += 1;
        self.table.bump_self(self.addr.id, self.heartbeat);

        // Prune before gossiping so the outgoing digest never carries a
        // peer we just declared dead.
        let stale: Vec<u32> = self
            .table
            .iter()
            .filter(|e| e.id != self.addr.id && now - e.timestamp > self.timers.t_remove)
            .map(|e| e.id)
            .collect();
        for id in stale {
            if let Some(entry) = self.table.remove(id) {
                log.node_remove(self.addr, entry.addr(), now);
            }
        }

        if self.ping_counter == 0 {
            // One encoded digest buffer serves the whole round.
            let frame = codec::encode_gossip(self.table.entries());
            for target in protocol::gossip_targets(&self.table, self.addr.id) {
                self.send(target, &frame, now, net, log);
            }
            self.ping_counter = self.timers.t_gossip;
        } else {
            self.ping_counter -= 1;
        }
    }

    fn send(
        &self,
        to: Address,
        frame: &[u8],
        now: i64,
        net: &mut dyn Network,
        log: &mut dyn LogSink,
    ) {
        // Gossip is best-effort: a refused send is logged and forgotten.
        if let Err(err) = net.send(self.addr, to, frame) {
            tracing::debug!(from = %self.addr, to = %to, error = %err, "Send failed");
            log.debug(self.addr, now, &format!("send to {to} failed: {err}"));
        }
    }
}

// --- Unit Tests ---
