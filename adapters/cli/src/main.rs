#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays headless Sporefront games.

mod session;

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use session::{SessionConfig, SessionSummary};

/// Sporefront - deterministic fungal colony simulation
#[derive(Parser, Debug)]
#[command(name = "sporefront")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed of the first game, overriding the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Board width, overriding the configuration
    #[arg(long)]
    width: Option<u32>,

    /// Board height, overriding the configuration
    #[arg(long)]
    height: Option<u32>,

    /// Number of colonies, overriding the configuration
    #[arg(short, long)]
    players: Option<u16>,

    /// Rounds per game, overriding the configuration
    #[arg(short, long)]
    rounds: Option<u32>,

    /// Games to play; consecutive seeds run in parallel
    #[arg(short, long, default_value = "1")]
    games: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut config = SessionConfig::load(args.config.as_deref())?;
    let settings = &mut config.session;
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(height) = args.height {
        settings.height = height;
    }
    if let Some(players) = args.players {
        settings.players = players;
    }
    if let Some(rounds) = args.rounds {
        settings.rounds = rounds;
    }
    config.validate()?;

    let first_seed = config.session.seed;
    if args.games <= 1 {
        let summary = session::run(&config, first_seed)
            .with_context(|| format!("game with seed {first_seed:#x} failed"))?;
        println!("{summary}");
        return Ok(());
    }

    let summaries = (0..args.games)
        .into_par_iter()
        .map(|offset| {
            let seed = first_seed.wrapping_add(offset);
            session::run(&config, seed).with_context(|| format!("game with seed {seed:#x} failed"))
        })
        .collect::<Result<Vec<SessionSummary>>>()?;

    let mut wins: BTreeMap<String, u64> = BTreeMap::new();
    for summary in &summaries {
        println!("{summary}\n");
        let leader = summary
            .leader()
            .map_or_else(|| "none".to_owned(), |id| id.to_string());
        *wins.entry(leader).or_default() += 1;
    }
    println!("leaders over {} games:", summaries.len());
    for (leader, count) in wins {
        println!("  {leader}: {count}");
    }
    Ok(())
}
