//! Configuration types for the game model.

use crate::error::{Error, Result};
use crate::physics::validate_time_step;
use serde::{Deserialize, Serialize};

/// Worm body and movement parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WormConfig {
    /// Density of a worm body (kg/m³)
    pub density: f64,
    /// Smallest radius a worm may have (m)
    pub min_radius: f64,
    /// Radius given to randomly spawned worms (m)
    pub spawn_radius: f64,
    /// Action points charged for a full 2π turn
    pub turn_cost_full_circle: f64,
    /// Newtons of jump force per remaining action point
    pub jump_force_per_action_point: f64,
    /// Hit points restored at the start of a worm's turn
    pub hit_point_regen: u32,
    /// Hit points lost per metre fallen
    pub fall_damage_per_metre: f64,
    /// Radius multiplier applied when eating a food ration
    pub growth_factor: f64,
    /// Largest divergence from the facing direction a move may take (rad)
    pub max_move_divergence: f64,
    /// Angular resolution of the move search (rad)
    pub move_divergence_step: f64,
    /// Shortest move, as a fraction of the radius
    pub min_move_fraction: f64,
    /// Distance resolution of the move and fall searches, as a fraction of the radius
    pub search_step_fraction: f64,
}

impl Default for WormConfig {
    fn default() -> Self {
        Self {
            density: 1062.0,
            min_radius: 0.25,
            spawn_radius: 0.5,
            turn_cost_full_circle: 60.0,
            jump_force_per_action_point: 5.0,
            hit_point_regen: 10,
            fall_damage_per_metre: 3.0,
            growth_factor: 1.1,
            max_move_divergence: 0.7875,
            move_divergence_step: 0.0175,
            min_move_fraction: 0.1,
            search_step_fraction: 0.01,
        }
    }
}

/// Food ration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    pub radius: f64,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self { radius: 0.20 }
    }
}

/// Parameters of a single weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Projectile mass (kg)
    pub projectile_mass: f64,
    /// Propulsion force at yield 0 (N)
    pub min_force: f64,
    /// Propulsion force at yield 100 (N)
    pub max_force: f64,
    /// Action points needed to fire
    pub cost: u32,
    /// Hit points removed from a worm that is hit
    pub damage: u32,
}

impl WeaponSpec {
    /// Propulsion force for a yield in 0..=100
    pub fn force(&self, yield_percent: u32) -> f64 {
        self.min_force + (self.max_force - self.min_force) * f64::from(yield_percent) / 100.0
    }
}

/// Weapon arsenal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Density of projectile bodies (kg/m³)
    pub projectile_density: f64,
    pub rifle: WeaponSpec,
    pub bazooka: WeaponSpec,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            projectile_density: 7800.0,
            rifle: WeaponSpec {
                projectile_mass: 0.010,
                min_force: 1.5,
                max_force: 1.5,
                cost: 10,
                damage: 20,
            },
            bazooka: WeaponSpec {
                projectile_mass: 0.300,
                min_force: 2.5,
                max_force: 9.5,
                cost: 50,
                damage: 80,
            },
        }
    }
}

/// Terrain classification parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Radius multiplier used to detect contact with terrain
    pub contact_inflation: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            contact_inflation: 1.1,
        }
    }
}

/// Program execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Maximum statements executed in a single run
    pub max_statements_per_run: u32,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            max_statements_per_run: 1000,
        }
    }
}

/// Random placement parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Random start points tried before giving up
    pub attempts: u32,
    /// Maximum number of teams in a world
    pub max_teams: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            attempts: 100,
            max_teams: 10,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Sampling interval used when programs jump or fire (s)
    pub time_step: f64,
    pub worm: WormConfig,
    pub food: FoodConfig,
    pub weapons: WeaponConfig,
    pub terrain: TerrainConfig,
    pub program: ProgramConfig,
    pub spawn: SpawnConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            time_step: 0.001,
            worm: WormConfig::default(),
            food: FoodConfig::default(),
            weapons: WeaponConfig::default(),
            terrain: TerrainConfig::default(),
            program: ProgramConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl GameConfig {
    /// Reject settings no world could play with
    pub fn validate(&self) -> Result<()> {
        validate_time_step(self.time_step)?;
        positive("worm.search_step_fraction", self.worm.search_step_fraction)?;
        positive("worm.move_divergence_step", self.worm.move_divergence_step)?;
        positive("worm.min_radius", self.worm.min_radius)?;
        if !(self.terrain.contact_inflation >= 1.0) || !self.terrain.contact_inflation.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "terrain.contact_inflation must be at least 1, got {}",
                self.terrain.contact_inflation
            )));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}
