//! src/emulnet.rs
//!
//! The emulated network: an in-process, discrete-time datagram fabric.
//! Frames sent during tick `t` sit in a per-address queue until the driver
//! drains them into node inboxes at the start of tick `t+1`, before any
//! node runs. Loss is simulated with a seeded RNG, so a run is reproducible
//! from its seed alone.

use crate::{domain::Address, error::SendError};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};

/// Upper bound on a single datagram. Anything larger is refused outright.
pub const MAX_FRAME_SIZE: usize = 16 * 1024;

/// The sending half of the fabric, as seen by a node.
pub trait Network {
    /// Fire-and-forget datagram send. The fabric may silently drop the
    /// frame in transit; an error means the frame never entered it at all.
    fn send(&mut self, from: Address, to: Address, payload: &[u8]) -> Result<(), SendError>;
}

/// Deterministic network emulator shared by every node in a run.
pub struct EmulNet {
    queues: HashMap<Address, VecDeque<Vec<u8>>>,
    rng: StdRng,
    drop_rate: f64,
    delivered: u64,
    dropped: u64,
}

impl EmulNet {
    pub fn new(seed: u64, drop_rate: f64) -> Self {
        Self {
            queues: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            drop_rate,
            delivered: 0,
            dropped: 0,
        }
    }

    /// Attaches an address to the fabric. Frames can only be addressed to
    /// attached destinations; attaching twice is harmless.
    pub fn attach(&mut self, addr: Address) {
        self.queues.entry(addr).or_default();
    }

    /// Changes the loss probability mid-run. Used to degrade an initially
    /// healthy fabric.
    pub fn set_drop_rate(&mut self, drop_rate: f64) {
        self.drop_rate = drop_rate;
    }

    /// Drains every frame queued for `addr`, in arrival order.
    pub fn drain(&mut self, addr: Address) -> Vec<Vec<u8>> {
        match self.queues.get_mut(&addr) {
            Some(queue) => queue.drain(..).collect(),
            None => Vec::new(),
        }
    }

    /// Frames accepted into a destination queue so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Frames lost in transit so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Network for EmulNet {
    fn send(&mut self, _from: Address, to: Address, payload: &[u8]) -> Result<(), SendError> {
        if payload.len() > MAX_FRAME_SIZE {
            return Err(SendError::Oversize(payload.len(), MAX_FRAME_SIZE));
        }
        let queue = self
            .queues
            .get_mut(&to)
            .ok_or(SendError::UnknownDestination(to))?;
        if self.drop_rate > 0.0 && self.rng.gen::<f64>() < self.drop_rate {
            // Loss is silent, like the real thing.
            self.dropped += 1;
            return Ok(());
        }
        queue.push_back(payload.to_vec());
        self.delivered += 1;
        Ok(())
    }
}

// --- Unit Tests ---
