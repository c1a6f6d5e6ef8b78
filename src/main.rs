//! src/main.rs
//!
//! Binary entry point. Responsible for initializing tracing, loading
//! configuration, instantiating the main `App`, and running it. Exits 0 on
//! clean completion and 1 on any failure.

use anyhow::Context;
use membership_net::{App, Config};

fn main() -> anyhow::Result<()> {
    // Initialize the tracing subscriber.
    // RUST_LOG=info will be the default.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Usage: membership-net [config.toml] [seed]
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "config.toml".to_owned());
    let seed_override = args
        .next()
        .map(|raw| raw.parse::<u64>())
        .transpose()
        .context("Seed must be an unsigned integer")?;

    let mut config = Config::load(&config_path).context("Failed to load configuration")?;
    if let Some(seed) = seed_override {
        config.seed = seed;
    }

    match App::new(config)?.run() {
        Ok(summary) => {
            tracing::info!(
                ticks = summary.ticks,
                delivered = summary.frames_delivered,
                dropped = summary.frames_dropped,
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            std::process::exit(1);
        }
    }
}
