//! src/app.rs
//!
//! Defines the main `App` struct, the application driver: it builds the
//! cluster described by the configuration, steps the emulated network and
//! every node once per logical tick, injects the scripted crash, and
//! reports a summary of the run.

use crate::{
    config::Config,
    domain::Address,
    emulnet::EmulNet,
    engine::{Node, Timers},
    error::Result,
    logsink::{EventLog, LogSink},
};
use serde::Serialize;

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub ticks: i64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    /// Final table size at every node still alive at the end, in id order.
    pub live_table_sizes: Vec<usize>,
}

/// Encapsulates one whole emulator run.
pub struct App {
    config: Config,
}

impl App {
    /// Creates a new `App` from the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs the simulation to completion.
    ///
    /// Each tick has two phases: first every queued frame is delivered into
    /// its destination inbox, then every node runs exactly once. Frames
    /// sent during a tick therefore arrive at the next one, and the outcome
    /// does not depend on the order nodes are stepped in.
    pub fn run(self) -> Result<Summary> {
        let config = &self.config;
        let mut log = EventLog::create(&config.dbg_log_path, &config.stats_log_path)?;
        let mut net = EmulNet::new(config.seed, config.drop_rate);
        let timers = Timers {
            t_fail: config.t_fail,
            t_remove: config.t_remove,
            t_gossip: config.t_gossip,
        };

        let mut nodes: Vec<Node> = (1..=config.node_count)
            .map(|id| Node::new(Address::new(id, 0), timers))
            .collect();
        for node in &nodes {
            net.attach(node.addr());
        }

        tracing::info!(
            nodes = config.node_count,
            ticks = config.total_ticks,
            seed = config.seed,
            drop_rate = config.drop_rate,
            "Starting membership run"
        );

        let mut started = 0usize;
        for now in 0..config.total_ticks {
            // One newcomer per stagger window, the introducer first.
            while started < nodes.len() && now == started as i64 * config.join_stagger_ticks {
                nodes[started].start(Address::INTRODUCER, now, &mut net, &mut log)?;
                started += 1;
            }

            if let Some(failure) = config.failure {
                if now == failure.at_tick {
                    self.inject_failure(&mut nodes, failure.node_id, now, &mut log);
                }
            }

            // Phase 1: every inbox is filled before any node runs.
            for node in &mut nodes {
                for frame in net.drain(node.addr()) {
                    node.enqueue(frame);
                }
            }

            // Phase 2: step every node once.
            for node in &mut nodes {
                node.tick(now, &mut net, &mut log);
            }
        }

        for node in nodes.iter().filter(|n| !n.is_failed()) {
            log.stat(
                node.addr(),
                config.total_ticks,
                &format!("members={}", node.table().len()),
            );
            if let Ok(table_json) = serde_json::to_string(node.table().entries()) {
                tracing::debug!(node = %node.addr(), table = %table_json, "Final membership table");
            }
        }

        let summary = Summary {
            ticks: config.total_ticks,
            frames_delivered: net.delivered(),
            frames_dropped: net.dropped(),
            live_table_sizes: nodes
                .iter()
                .filter(|n| !n.is_failed())
                .map(|n| n.table().len())
                .collect(),
        };
        if let Ok(payload) = serde_json::to_string(&summary) {
            tracing::debug!(payload = %payload, "Run summary");
        }
        Ok(summary)
    }

    fn inject_failure(&self, nodes: &mut [Node], node_id: u32, now: i64, log: &mut EventLog) {
        match nodes.iter_mut().find(|n| n.addr().id == node_id) {
            Some(victim) => {
                tracing::info!(node = %victim.addr(), tick = now, "Injecting crash");
                log.debug(victim.addr(), now, "node crashed");
                victim.fail();
            }
            None => {
                tracing::warn!(node_id, "Scripted failure names an unknown node; skipping");
            }
        }
    }
}

// --- Unit Tests ---
