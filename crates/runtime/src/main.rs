#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use experiment::{Experiment, ExperimentConfig};
use mechanism::{Chain, ChainConfig};
use runtime::world::RelaxWorld;

/// Drives the chain rig through its pose-randomize-settle-record cycle
/// against the built-in stand-in world.
#[derive(Parser, Debug)]
#[command(name = "runtime_main")]
struct Args {
    /// Number of chain segments beyond the anchor link.
    #[arg(long, default_value_t = 2)]
    links: usize,

    /// Seed for the pose randomizer.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulation steps to run; 0 runs until interrupted.
    #[arg(long, default_value_t = 10_000)]
    steps: u64,

    /// Simulation time step in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// JSON file with experiment config overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured session data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ExperimentConfig::from_json(&json)?
        }
        None => ExperimentConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let chain_config = ChainConfig {
        link_count: args.links,
        ..ChainConfig::default()
    };

    tracing::info!(links = args.links, seed = args.seed, "building chain rig");
    let mut world = RelaxWorld::new();
    let chain = Chain::build(&mut world, &chain_config);
    let mut experiment = Experiment::new(config, args.seed)?;

    tracing::info!(steps = args.steps, dt = args.dt, "starting experiment loop");
    let mut step: u64 = 0;
    while args.steps == 0 || step < args.steps {
        world.step(args.dt);
        experiment.tick(&mut world, &chain)?;
        step += 1;

        if step % 1000 == 0 {
            let status = experiment.status();
            tracing::info!(
                step,
                phase = ?status.phase,
                session = status.session_index,
                stalled = status.stalled,
                "experiment progress"
            );
        }
    }

    let status = experiment.status();
    tracing::info!(
        sessions = status.session_index,
        phase = ?status.phase,
        "experiment loop finished"
    );
    Ok(())
}
