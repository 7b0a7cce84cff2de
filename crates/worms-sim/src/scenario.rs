//! Battle scenarios: terrain, worms, food and programs described in JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use worms_core::{Error, GameConfig, Position, Result};
use worms_program::Program;
use worms_runtime::Runtime;
use worms_world::{Food, TerrainGrid, Team, World, Worm};

/// A program given inline or as a path relative to the scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgramSource {
    File(PathBuf),
    Inline(Program),
}

impl ProgramSource {
    pub fn load(&self, base_dir: &Path) -> Result<Program> {
        match self {
            ProgramSource::Inline(program) => Ok(program.clone()),
            ProgramSource::File(path) => {
                let text = fs::read_to_string(base_dir.join(path))?;
                Program::from_json(&text)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WormSpec {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub direction: f64,
    #[serde(default = "default_worm_radius")]
    pub radius: f64,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub program: Option<ProgramSource>,
}

fn default_worm_radius() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSpec {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub width: f64,
    pub height: f64,
    /// Terrain rows from top to bottom; '#' marks solid ground
    #[serde(default)]
    pub map: Vec<String>,
    #[serde(default)]
    pub config: GameConfig,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub worms: Vec<WormSpec>,
    #[serde(default)]
    pub food: Vec<FoodSpec>,
    /// Extra food rations dropped at random spots
    #[serde(default)]
    pub random_food: u32,
    #[serde(default = "default_max_turns")]
    pub max_turns: u64,
}

fn default_max_turns() -> u64 {
    100
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn grid(&self) -> Result<TerrainGrid> {
        if self.map.is_empty() {
            return Ok(TerrainGrid::empty(self.width, self.height));
        }
        let rows: Vec<&str> = self.map.iter().map(String::as_str).collect();
        TerrainGrid::from_ascii(self.width, self.height, &rows)
    }

    /// Populate a fresh world. Program files resolve against `base_dir`.
    pub fn build(&self, runtime: &Runtime, base_dir: &Path) -> Result<World> {
        let mut world = World::with_grid(self.grid()?, self.config.clone())?;

        for name in &self.teams {
            world.add_team(Team::new(name)?)?;
        }

        for spec in &self.worms {
            let mut worm = Worm::new(
                &spec.name,
                Position::new(spec.x, spec.y),
                spec.direction,
                spec.radius,
                &self.config.worm,
            )?;
            if let Some(source) = &spec.program {
                let program = source.load(base_dir)?;
                worm.attach_program(runtime.instantiate(program));
            }
            let id = world.add_worm(worm)?;
            if let Some(team) = &spec.team {
                world.join_team(id, team)?;
            }
            debug!(event = "scenario_worm", worm = %id, name = %spec.name, team = ?spec.team);
        }

        for spec in &self.food {
            world.add_food(Food::new(Position::new(spec.x, spec.y), &self.config.food)?)?;
        }
        for _ in 0..self.random_food {
            world.add_new_food()?;
        }

        info!(
            event = "scenario_built",
            worms = world.worms().len(),
            food = world.food_rations().count(),
            teams = world.teams().len()
        );
        Ok(world)
    }
}
