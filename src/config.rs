//! src/config.rs
//!
//! Defines the strongly-typed `Config` struct for all runtime parameters of
//! an emulator run, loaded from a TOML file and environment variables via
//! `figment`.

use crate::error::{Error, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level struct holding all configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of nodes in the cluster; ids run `1..=node_count`.
    pub node_count: u32,
    /// Total logical ticks to run.
    pub total_ticks: i64,
    /// Ticks between consecutive node start-ups. Zero starts everyone at
    /// tick 0.
    pub join_stagger_ticks: i64,
    /// Ticks of silence after which a peer counts as failed.
    pub t_fail: i64,
    /// Ticks of silence after which a peer is dropped from the table.
    pub t_remove: i64,
    /// Ticks between gossip rounds.
    pub t_gossip: i64,
    /// Probability that the fabric drops any given frame.
    pub drop_rate: f64,
    /// RNG seed for the fabric; same seed, same run.
    pub seed: u64,
    /// Optional scripted crash.
    pub failure: Option<FailureConfig>,
    pub dbg_log_path: PathBuf,
    pub stats_log_path: PathBuf,
}

/// A single scripted crash: `node_id` stops cold at `at_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureConfig {
    pub node_id: u32,
    pub at_tick: i64,
}

impl Config {
    /// Loads configuration from the given TOML file and `MEMBERSHIP_`
    /// environment variables. It uses the `Default` implementation as a
    /// base layer.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("MEMBERSHIP_"))
            .extract()
    }

    /// Sanity-checks values the type system cannot.
    pub fn validate(&self) -> Result<()> {
        if self.node_count == 0 {
            return Err(Error::InvalidConfig("node_count must be at least 1".into()));
        }
        if self.total_ticks < 0 {
            return Err(Error::InvalidConfig("total_ticks must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.drop_rate) {
            return Err(Error::InvalidConfig("drop_rate must be within [0, 1]".into()));
        }
        if self.t_gossip <= 0 {
            return Err(Error::InvalidConfig("t_gossip must be positive".into()));
        }
        if self.t_fail < 0 || self.t_remove < self.t_fail {
            return Err(Error::InvalidConfig(
                "t_remove must be at least t_fail, and both non-negative".into(),
            ));
        }
        if self.join_stagger_ticks < 0 {
            return Err(Error::InvalidConfig(
                "join_stagger_ticks must not be negative".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_count: 10,
            total_ticks: 700,
            join_stagger_ticks: 5,
            t_fail: 5,
            t_remove: 20,
            t_gossip: 5,
            drop_rate: 0.0,
            seed: 1,
            failure: None,
            dbg_log_path: PathBuf::from("dbg.log"),
            stats_log_path: PathBuf::from("stats.log"),
        }
    }
}
