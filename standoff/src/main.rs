//! Standoff confrontation driver.
//!
//! Runs one conflict in the terminal against the built-in opponent policy.
//!
//! ```bash
//! cargo run -p standoff -- --opponent "Black Bart" --stakes "the strongbox" \
//!     --protagonist-pool 2d4+2d6 --opponent-pool 2d4+1d8
//! ```
//!
//! Pass `--auto` to let the policy play both sides, and `--json` to print the
//! aftermath as JSON when the conflict ends.

mod headless;
mod render;

use anyhow::Context;
use clap::Parser;
use standoff_core::{ConfigError, EngineConfig, PoolSpec};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use headless::HeadlessConfig;

#[derive(Debug, Parser)]
#[command(name = "standoff", version, about = "Run a raise-and-match confrontation in the terminal")]
struct Args {
    /// Engine config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible conflict
    #[arg(long)]
    seed: Option<u64>,

    /// Who the protagonist is up against
    #[arg(long, default_value = "stranger")]
    opponent: String,

    /// What the conflict is over
    #[arg(long, default_value = "the right of way")]
    stakes: String,

    /// Opening pool for the protagonist, e.g. 2d4+2d6
    #[arg(long, default_value = "2d4+2d6")]
    protagonist_pool: PoolSpec,

    /// Opening pool for the opponent
    #[arg(long, default_value = "2d4+2d6")]
    opponent_pool: PoolSpec,

    /// Let the opponent policy play the protagonist too
    #[arg(long)]
    auto: bool,

    /// Print the aftermath as JSON
    #[arg(long)]
    json: bool,

    /// Override the opponent's thinking delay
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Override the chance the opponent escalates instead of giving
    #[arg(long)]
    escalate_chance: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut engine = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(delay_ms) = args.delay_ms {
        engine = engine.with_thinking_delay_ms(delay_ms);
    }
    if let Some(chance) = args.escalate_chance {
        engine = engine.with_escalate_chance(chance);
    }
    engine.validate()?;

    let config = HeadlessConfig {
        engine,
        seed: args.seed,
        opponent: args.opponent,
        stakes: args.stakes,
        protagonist_pool: args.protagonist_pool,
        opponent_pool: args.opponent_pool,
        auto: args.auto,
        json: args.json,
    };

    headless::run_headless(config).await
}

fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: EngineConfig =
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(config)
}
