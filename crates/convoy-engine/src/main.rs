//! # Convoy Sim
//!
//! Runs a scripted leader through a scene and prints how the followers kept up.

#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use convoy_engine::{scenario, SimConfig, CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Configuration file to load
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_default: Option<PathBuf>,
    /// Override the number of followers
    #[arg(long)]
    followers: Option<u32>,
    /// Override the leader speed (m/s)
    #[arg(long)]
    speed: Option<f32>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("convoy=info".parse()?))
        .init();

    let cli = Cli::parse();

    if let Some(path) = cli.write_default {
        SimConfig::default()
            .save_to(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        return Ok(());
    }

    let mut config = SimConfig::load_from(&cli.config);
    if let Some(count) = cli.followers {
        config.scenario.follower_count = count;
    }
    if let Some(speed) = cli.speed {
        config.scenario.leader_speed = speed;
    }
    config.validate();

    info!("Convoy sim {}", env!("CARGO_PKG_VERSION"));
    let report = scenario::run(&config);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} ticks, {} frames, trail {:.2} m over {} samples",
        report.ticks, report.frames, report.recorded_distance, report.recorded_samples
    );
    for follower in &report.followers {
        println!(
            "  {} rank {}: target {:.2} m, gap min {:.3} / mean {:.3} / max {:.3}",
            follower.follower,
            follower.index,
            follower.target_distance,
            follower.min_gap,
            follower.mean_gap,
            follower.max_gap
        );
    }
    println!(
        "  exit {}",
        if report.exit_with_companion {
            "with companion"
        } else {
            "alone"
        }
    );
    Ok(())
}
