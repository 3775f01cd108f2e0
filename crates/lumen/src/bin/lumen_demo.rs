//! # LUMEN Demo
//!
//! Headless run of the position scenario:
//!
//! ```bash
//! lumen_demo --ticks 5
//! RUST_LOG=debug lumen_demo --config registry.toml --recycle
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lumen::ecs::{IdPolicy, Position, RegistryConfig, Velocity};
use lumen::{GameLoop, GameLoopConfig, MovementSystem, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen_demo")]
#[command(about = "Headless LUMEN entity-component demo")]
struct Cli {
    /// Registry configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long, default_value_t = 3)]
    ticks: u32,

    /// Reuse destroyed entity indices
    #[arg(long)]
    recycle: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    if cli.recycle {
        config.id_policy = IdPolicy::Recycle;
    }

    let mut scene = Scene::new("demo", config)?;

    // Entities 0..4; only 1 and 3 are positioned, 3 also moves.
    let mut entities = Vec::with_capacity(5);
    for _ in 0..5 {
        entities.push(scene.spawn()?);
    }
    let builtins = scene.builtins();
    scene
        .registry_mut()
        .insert(entities[1], builtins.position, Position::new(1.0, 2.0, 3.0))?;
    scene
        .registry_mut()
        .insert(entities[3], builtins.position, Position::new(4.0, 5.0, 6.0))?;
    scene
        .registry_mut()
        .insert(entities[3], builtins.velocity, Velocity::new(1.0, 0.0, -1.0))?;

    let loop_config = GameLoopConfig::default();
    let delta = loop_config.fixed_delta();
    let mut game_loop = GameLoop::new(loop_config);
    game_loop.add_system(MovementSystem::for_scene(&scene));

    for _ in 0..cli.ticks {
        let stats = game_loop.tick_with_delta(&mut scene, delta)?;
        info!(frame = stats.frame, us = stats.total_us, "tick");
    }

    for (entity, position) in scene.positions()? {
        println!(
            "entity {entity}: position ({:.3}, {:.3}, {:.3})",
            position.x, position.y, position.z
        );
    }
    for &entity in &entities {
        if scene.position(entity)?.is_none() {
            println!("entity {entity}: no position");
        }
    }

    info!(
        frames = game_loop.frame_count(),
        avg_ms = game_loop.stats().avg_frame_ms(),
        "demo finished"
    );
    Ok(())
}
