//! `ringctl` — inspect consistent hashing ring routing.
//!
//! Builds a ring from a config file and/or `--node` flags, then answers
//! routing questions about it.
//!
//! # Usage
//!
//! ```text
//! ringctl -n cache-a -n cache-b locate user:1 user:2   # which node owns each key
//! ringctl -c ring.toml spread --samples 100000         # per-node key share
//! ringctl -c ring.toml diff --add cache-d              # keys remapped by a join
//! ```

mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use cachering::{Ring, Snapshot};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "ringctl", version, about = "Consistent hashing ring inspector")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Node name(s) to place on the ring. Replaces the configured nodes.
    #[arg(short, long, global = true)]
    node: Vec<String>,

    /// Override the configured virtual nodes per node.
    #[arg(short, long, global = true)]
    replicas: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node that owns each key.
    Locate {
        /// Keys to route.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show how synthetic keys spread across nodes.
    Spread {
        /// Number of synthetic keys to route.
        #[arg(short, long, default_value = "10000")]
        samples: usize,
    },

    /// Show how many keys move when a node joins.
    Diff {
        /// Node to add.
        #[arg(short, long)]
        add: String,

        /// Number of synthetic keys to route.
        #[arg(short, long, default_value = "10000")]
        samples: usize,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    // CLI args override config file values.
    if !cli.node.is_empty() {
        config.ring.nodes = cli.node;
    }
    if let Some(r) = cli.replicas {
        config.ring.replicas = r;
    }
    if config.ring.nodes.is_empty() {
        bail!("no nodes configured; pass --node or set [ring] nodes");
    }

    let ring = Ring::from_config(&config.ring);
    info!(
        nodes = ring.node_count(),
        vnodes = ring.vnode_count(),
        replicas = ring.replicas(),
        hash = ?config.ring.hash,
        "ring built"
    );

    match cli.command {
        Commands::Locate { keys } => cmd_locate(&ring, &keys),
        Commands::Spread { samples } => cmd_spread(&ring, samples),
        Commands::Diff { add, samples } => cmd_diff(&ring, &add, samples),
    }
    Ok(())
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn sample_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("sample-key-{i}")).collect()
}

// -----------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------

fn cmd_locate(ring: &Ring, keys: &[String]) {
    for key in keys {
        match ring.get(key) {
            Some(node) => println!("{key} -> {node}"),
            None => println!("{key} -> <none>"),
        }
    }
}

fn cmd_spread(ring: &Ring, samples: usize) {
    let mut counts: BTreeMap<String, usize> = ring
        .snapshot()
        .node_names()
        .into_iter()
        .map(|n| (n.to_string(), 0))
        .collect();

    for key in sample_keys(samples) {
        if let Some(node) = ring.get(&key) {
            *counts.entry(node.to_string()).or_default() += 1;
        }
    }

    let ideal = 100.0 / counts.len().max(1) as f64;
    println!("{:<32} {:>10} {:>8}", "NODE", "KEYS", "SHARE");
    for (node, count) in &counts {
        let share = 100.0 * *count as f64 / samples.max(1) as f64;
        println!("{node:<32} {count:>10} {share:>7.2}%");
    }
    println!("ideal share per node: {ideal:.2}%");
}

fn cmd_diff(ring: &Ring, add: &str, samples: usize) {
    let before = ring.snapshot();
    ring.add_node(add);
    let after = ring.snapshot();

    let keys = sample_keys(samples);
    let moved = Snapshot::remapped(
        &before,
        &after,
        keys.iter().map(String::as_str),
        ring.hash_fn(),
    );
    debug!(moved = moved.len(), samples, "computed remap");

    let ratio = 100.0 * moved.len() as f64 / samples.max(1) as f64;
    let expected = 100.0 / after.node_count().max(1) as f64;
    println!("adding {add}: {} of {samples} keys remapped ({ratio:.2}%)", moved.len());
    println!("expected for {} nodes: ~{expected:.2}%", after.node_count());

    let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
    for remap in &moved {
        let from = remap.from.as_deref().unwrap_or("<none>").to_string();
        *by_source.entry(from).or_default() += 1;
    }
    for (from, count) in by_source {
        println!("  {from:<30} -> {add}: {count}");
    }
}
