//! Weapons and the projectiles they fire.

use crate::entity::{Body, Massive, Placed};
use serde::{Deserialize, Serialize};
use std::fmt;
use worms_core::{
    is_valid_direction, physics, EntityId, EntityKind, Error, Position, Result, WeaponConfig,
    WeaponSpec,
};

/// Highest propulsion yield a weapon accepts
pub const MAX_YIELD: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    #[default]
    Rifle,
    Bazooka,
}

impl WeaponKind {
    /// The weapon selected after this one
    pub fn next(self) -> Self {
        match self {
            WeaponKind::Rifle => WeaponKind::Bazooka,
            WeaponKind::Bazooka => WeaponKind::Rifle,
        }
    }

    pub fn spec(self, config: &WeaponConfig) -> &WeaponSpec {
        match self {
            WeaponKind::Rifle => &config.rifle,
            WeaponKind::Bazooka => &config.bazooka,
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaponKind::Rifle => f.write_str("rifle"),
            WeaponKind::Bazooka => f.write_str("bazooka"),
        }
    }
}

/// Check a propulsion yield before firing
pub fn validate_yield(yield_percent: u32) -> Result<()> {
    if yield_percent > MAX_YIELD {
        return Err(Error::InvalidArgument(format!(
            "illegal yield {} (maximum {})",
            yield_percent, MAX_YIELD
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Projectile {
    body: Body,
    direction: f64,
    density: f64,
    weapon: WeaponKind,
    yield_percent: u32,
    force: f64,
    owner: Option<EntityId>,
}

impl Projectile {
    pub fn new(
        position: Position,
        direction: f64,
        weapon: WeaponKind,
        yield_percent: u32,
        config: &WeaponConfig,
        owner: Option<EntityId>,
    ) -> Result<Self> {
        validate_yield(yield_percent)?;
        if !is_valid_direction(direction) {
            return Err(Error::InvalidArgument(format!(
                "illegal direction {}",
                direction
            )));
        }
        let spec = weapon.spec(config);
        let radius = physics::sphere_radius(config.projectile_density, spec.projectile_mass);

        Ok(Self {
            body: Body::new(position, radius, f64::MIN_POSITIVE)?,
            direction,
            density: config.projectile_density,
            weapon,
            yield_percent,
            force: spec.force(yield_percent),
            owner,
        })
    }

    pub fn weapon(&self) -> WeaponKind {
        self.weapon
    }

    pub fn yield_percent(&self) -> u32 {
        self.yield_percent
    }

    /// The worm that fired this projectile
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub(crate) fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Placed for Projectile {
    fn body(&self) -> &Body {
        &self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Projectile
    }
}

impl Massive for Projectile {
    fn direction(&self) -> f64 {
        self.direction
    }

    fn density(&self) -> f64 {
        self.density
    }

    fn jump_force(&self) -> f64 {
        self.force
    }
}
