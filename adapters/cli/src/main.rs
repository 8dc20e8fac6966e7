#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Libra simulation headlessly.
//!
//! The binary loads the tile and map tables (embedded defaults unless paths
//! are supplied), generates the requested map, places the player and the
//! scheduled enemies, and steps the simulation for a fixed number of frames
//! with idle controls before logging a summary.

mod headless;

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use headless::{HeadlessBackend, RunSummary};
use libra_core::{MapDefinitionTable, SimulationConfig, TileDefinitionTable};
use libra_rendering::{debug_render, render, render_heat_map, HeatMapMode, RenderingBackend};
use libra_system_behavior::ControlInput;
use libra_system_simulation::Simulation;
use libra_world::{query, BlockingPolicy, World};
use log::info;

const DEFAULT_TILES: &str = include_str!("../data/tiles.toml");
const DEFAULT_MAPS: &str = include_str!("../data/maps.toml");

/// Runs a Libra map without a window.
#[derive(Parser, Debug)]
#[command(name = "libra", version, about = "Headless runner for the Libra tank simulation")]
struct Cli {
    /// Tile definition table (TOML). Defaults to the bundled table.
    #[arg(long, value_name = "PATH")]
    tiles: Option<PathBuf>,

    /// Map definition table (TOML). Defaults to the bundled table.
    #[arg(long, value_name = "PATH")]
    maps: Option<PathBuf>,

    /// Simulation tuning (TOML). Missing fields keep their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Name of the map to generate.
    #[arg(long, default_value = "outskirts")]
    map: String,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Seconds advanced per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Seed for map generation and every random decision.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Also build debug overlays and the navigation heat map every frame.
    #[arg(long)]
    debug_draw: bool,
}

fn read_or_default(path: Option<&PathBuf>, default: &'static str) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => Ok(default.to_owned()),
    }
}

fn load_world(cli: &Cli) -> Result<World> {
    let tiles_source = read_or_default(cli.tiles.as_ref(), DEFAULT_TILES)?;
    let maps_source = read_or_default(cli.maps.as_ref(), DEFAULT_MAPS)?;
    let config = match &cli.config {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SimulationConfig::from_toml_str(&source)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    let definitions =
        Arc::new(TileDefinitionTable::from_toml_str(&tiles_source).context("invalid tile table")?);
    let maps = MapDefinitionTable::from_toml_str(&maps_source, &definitions)
        .context("invalid map table")?;
    let world = World::from_tables(definitions, &maps, &cli.map, config, cli.seed)
        .with_context(|| format!("failed to build map `{}`", cli.map))?;
    Ok(world)
}

fn run(cli: &Cli) -> Result<RunSummary> {
    let mut world = load_world(cli)?;
    let mut events = Vec::new();
    let _ = world.spawn_player(&mut events);
    world.populate_enemies(&mut events);
    info!(
        "map `{}` ready with {} entities",
        query::map_name(&world),
        query::registry(&world).len()
    );

    let mut summary = RunSummary::default();
    summary.record(&events);
    let mut simulation = Simulation::new();
    let mut backend = HeadlessBackend::default();
    let input = ControlInput::default();

    for _ in 0..cli.frames {
        events.clear();
        simulation.step(&mut world, &input, cli.dt, &mut events)?;
        summary.record(&events);

        let mut frame = render(&world);
        if cli.debug_draw {
            frame.append(debug_render(&world));
            if let Some(field) = query::map_field(&world, BlockingPolicy::STRICT) {
                frame.append(render_heat_map(field, HeatMapMode::Gradient));
            }
        }
        backend.present(&frame)?;

        if query::player(&world).is_some_and(|player| player.is_dead) {
            info!("player destroyed on frame {}, respawning", simulation.frame());
            summary.player_deaths += 1;
            events.clear();
            let _ = world.spawn_player(&mut events);
        }
        if query::player_reached_goal(&world) {
            info!("player reached the goal on frame {}", simulation.frame());
            summary.goal_reached = true;
            break;
        }
    }
    backend.finish()?;

    summary.frames = simulation.frame();
    summary.population = query::population(&world);
    summary.vertices_presented = backend.vertices_presented();
    Ok(summary)
}

/// Entry point for the Libra command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let summary = run(&cli)?;
    summary.log();
    Ok(())
}
