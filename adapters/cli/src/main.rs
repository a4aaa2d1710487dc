#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless horde encounter and reports the outcome.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;

use simulation::{RunLimits, Simulation, Summary};

/// Runs a horde encounter without rendering and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "horde-sim", version)]
struct Cli {
    /// Encounter TOML file; the built-in encounter is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for every random stream.
    #[arg(short, long, default_value_t = 0x5eed)]
    seed: u64,

    /// Simulated seconds to run for.
    #[arg(short, long, default_value_t = 120.0)]
    duration: f32,

    /// Fixed frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Stop after this many waves have been cleared.
    #[arg(short, long)]
    waves: Option<u32>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,

    /// Raise log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Entry point for the horde simulator.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .init();

    ensure!(
        (1..=1_000).contains(&cli.tick_ms),
        "--tick-ms must lie within 1..=1000, got {}",
        cli.tick_ms
    );
    ensure!(
        cli.duration.is_finite() && cli.duration >= 0.0,
        "--duration must be a non-negative number of seconds"
    );

    let encounter = config::load(cli.config.as_deref())?;
    let mut simulation = Simulation::new(&encounter, cli.seed);
    let summary = simulation.run(RunLimits {
        duration: horde_core::duration_from_secs(cli.duration),
        tick: Duration::from_millis(cli.tick_ms),
        waves: cli.waves,
    });

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Default log filter for the given number of `-v` flags; `RUST_LOG` overrides it.
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn print_summary(summary: &Summary) {
    let tally = &summary.tally;
    println!("seed                {}", summary.seed);
    println!("elapsed             {:.1}s", summary.elapsed_seconds);
    println!(
        "waves               {} started, {} cleared",
        tally.waves_started, tally.waves_completed
    );
    println!(
        "enemies             {} spawned, {} killed, {} alive, {} rejected",
        tally.spawns, tally.kills, summary.enemies_alive, tally.rejected_spawns
    );
    println!(
        "pickups             {} dropped, {} collected",
        tally.pickups_dropped, tally.pickups_collected
    );
    println!("critical hits       {}", tally.critical_hits);
    println!("level               {} ({} xp)", summary.level, summary.xp);
    println!("perks               {}", summary.perks.join(", "));
    println!("difficulty          {:.3}", summary.difficulty);
    println!(
        "player              {:.1}/{:.1}{}",
        summary.player_health,
        summary.player_max_health,
        if tally.player_died { " (dead)" } else { "" }
    );
    for pool in &summary.pools {
        println!(
            "pool {:<14} {} idle, {} active, {} overflow, {} destroyed",
            pool.key, pool.idle, pool.active, pool.overflow_allocations, pool.destroyed
        );
    }
    if tally.despawns > 0 {
        println!("despawned           {}", tally.despawns);
    }
}
