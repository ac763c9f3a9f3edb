//! Headless session driver: streams chunks around a simulated walker.
//!
//! Rendering is left to an embedding collaborator; this binary exercises
//! the full pipeline (noise, generation, meshing, streaming, physics) and
//! reports progress through the log.

mod player;
mod streaming;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use cairn_geom::Vec3;
use cairn_runtime::Runtime;
use cairn_world::{ChunkCoord, GenParams, World};
use clap::Parser;

use crate::player::{InputState, Walker};
use crate::streaming::ChunkStreamer;

const TICK_DT: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "cairn", about = "Voxel chunk streaming engine (headless driver)")]
struct Args {
    /// World seed.
    #[arg(long, default_value_t = 1337)]
    seed: i32,

    /// Render distance in chunks (circular).
    #[arg(long, default_value_t = 8)]
    render_distance: i32,

    /// Simulation length in ticks.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Worker thread count; defaults to cores minus one.
    #[arg(long)]
    workers: Option<usize>,

    /// Optional TOML file overriding generation parameters.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let params = match &args.config {
        Some(path) => match GenParams::load_from_path(path) {
            Ok(p) => p,
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => GenParams::default(),
    };

    let world = Arc::new(World::new(args.seed, params));
    let runtime = match args.workers {
        Some(n) => Runtime::with_workers(world.clone(), n),
        None => Runtime::new(world.clone()),
    };
    log::info!(
        "seed {} render_distance {} workers {}",
        args.seed,
        args.render_distance,
        runtime.workers
    );

    let mut streamer = ChunkStreamer::new(world, runtime, args.render_distance);

    // Wait for the spawn chunk, then stand the walker on its surface.
    let spawn_probe = Vec3::new(8.0, 80.0, 8.0);
    while !streamer.is_chunk_data_ready(ChunkCoord::new(0, 0)) {
        streamer.tick(spawn_probe);
        std::thread::sleep(Duration::from_millis(5));
    }
    let surface = streamer.highest_solid_y(8, 8);
    let mut walker = Walker::new(Vec3::new(8.5, (surface + 1) as f32, 8.5));
    log::info!("spawned at ({}, {}, {})", walker.pos.x, walker.pos.y, walker.pos.z);

    // Walk forward, turning slowly, so the streamer keeps working.
    let input = InputState {
        forward: true,
        ..InputState::default()
    };
    for tick in 0..args.ticks {
        streamer.tick(walker.pos);
        walker.yaw = tick as f32 * 0.05;
        let sample = |x, y, z| streamer.get_block(x, y, z);
        walker.update(&input, TICK_DT, &sample);

        if tick % 120 == 0 {
            let batches: usize = streamer.visible_batches().map(|(_, b)| b.len()).sum();
            log::info!(
                "tick {tick}: pos ({:.1}, {:.1}, {:.1}) chunks {} batches {} jobs {}",
                walker.pos.x,
                walker.pos.y,
                walker.pos.z,
                streamer.loaded_chunks(),
                batches,
                streamer.pending_jobs()
            );
        }
    }

    log::info!(
        "done: {} chunks loaded, {} jobs still pending",
        streamer.loaded_chunks(),
        streamer.pending_jobs()
    );
    ExitCode::SUCCESS
}
