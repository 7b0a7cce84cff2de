//! Headless runner for worm battle scenarios.
//!
//! Loads a scenario, lets every worm's program play its turns and prints a
//! JSON summary of the outcome on stdout.

mod scenario;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use scenario::Scenario;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use worms_runtime::{HandlerEvent, RecordingHandler, RunOutcome, Runtime, RuntimeConfig};
use worms_world::{Massive, Placed, Winner, World, WorldState};

#[derive(Parser)]
#[command(name = "worms-sim")]
#[command(about = "Play a worms battle scenario without a screen")]
struct Args {
    /// Path to the scenario JSON file
    scenario: PathBuf,

    /// Override the scenario's turn limit
    #[arg(long)]
    max_turns: Option<u64>,

    /// Override the world seed
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Serialize)]
struct WormSummary {
    name: String,
    team: Option<String>,
    x: f64,
    y: f64,
    radius: f64,
    direction: f64,
    hit_points: u32,
    action_points: u32,
}

#[derive(Debug, Serialize)]
struct Summary {
    winner: Option<Winner>,
    finished: bool,
    turns: u64,
    worms: Vec<WormSummary>,
    food_left: usize,
    events: Vec<HandlerEvent>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry(args.json_logs)?;

    let mut scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;
    if let Some(seed) = args.seed {
        scenario.config.seed = seed;
    }
    let max_turns = args.max_turns.unwrap_or(scenario.max_turns);
    let base_dir = args
        .scenario
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let handler = Arc::new(RecordingHandler::new());
    let runtime = Runtime::new(RuntimeConfig::from(&scenario.config.program), handler.clone());
    let mut world = scenario
        .build(&runtime, &base_dir)
        .context("failed to build the world")?;

    let turns = play(&mut world, max_turns)?;
    let summary = summarize(&world, turns, handler.take_events());
    println!("{}", serde_json::to_string_pretty(&summary)?);

    world.terminate();
    Ok(())
}

/// Play turns until the game finishes or the turn limit is reached.
///
/// Returns the number of turns played.
#[instrument(skip(world), fields(world = %world.id()))]
fn play(world: &mut World, max_turns: u64) -> Result<u64> {
    world.start()?;

    let mut turns = 0;
    while world.is_in_progress() && turns < max_turns {
        turns += 1;
        if world.current_worm().is_some() {
            match world.run_current_program() {
                Ok(Some(RunOutcome::Suspended(reason))) => {
                    info!(event = "turn_suspended", turn = turns, reason = ?reason);
                }
                Ok(_) => {}
                // A faulted program only costs its worm the turn
                Err(err) => warn!(event = "program_error", turn = turns, error = %err),
            }
        }
        world.start_next_turn()?;
    }

    if world.state() == WorldState::Finished {
        info!(event = "battle_over", turns, winner = ?world.winner());
    } else {
        info!(event = "turn_limit_reached", turns);
    }
    Ok(turns)
}

fn summarize(world: &World, turns: u64, events: Vec<HandlerEvent>) -> Summary {
    let worms = world
        .worms()
        .iter()
        .map(|worm| WormSummary {
            name: worm.name().to_string(),
            team: worm.team().map(str::to_string),
            x: worm.position().x,
            y: worm.position().y,
            radius: worm.radius(),
            direction: worm.direction(),
            hit_points: worm.hit_points(),
            action_points: worm.action_points(),
        })
        .collect();

    Summary {
        winner: world.winner(),
        finished: world.state() == WorldState::Finished,
        turns,
        worms,
        food_left: world.food_rations().count(),
        events,
    }
}
