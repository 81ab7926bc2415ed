//! ironmud - server entry point
//!
//! Loads the config, builds the demo world and serves it over TCP.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ironmud::content::{demo_world, Prefabs};
use ironmud::core::config::GameConfig;
use ironmud::core::error::Result;
use ironmud::ecs::World;
use ironmud::server::serve;
use ironmud::simulation::Game;

#[derive(Debug, Parser)]
#[command(name = "ironmud", about = "Multi-player text world server")]
struct Args {
    /// TOML config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config
    #[arg(long)]
    listen: Option<String>,

    /// Seed for combat and NPC rolls, overriding the config
    #[arg(long)]
    seed: Option<u64>,

    /// Extra prefab definitions (TOML); same-named stock prefabs are replaced
    #[arg(long)]
    prefabs: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ironmud=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    tracing::info!(
        tick_rate_hz = config.tick_rate_hz,
        seed = config.seed,
        "ironmud starting"
    );

    let mut prefabs = Prefabs::builtin();
    if let Some(path) = &args.prefabs {
        prefabs.load_file(path)?;
    }

    let mut world = World::new();
    demo_world(&mut world, &prefabs)?;
    serve(Game::new(config, world).with_prefabs(prefabs)).await
}
