//! Entity capabilities shared by worms, food and projectiles.

use crate::food::Food;
use crate::projectile::Projectile;
use crate::worm::Worm;
use worms_core::{physics, Ballistic, EntityId, EntityKind, Error, Position, Result, WorldId};

/// Where an entity stands with respect to worlds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Detached,
    Member(WorldId),
    Terminated,
}

/// Identity, placement and membership common to every entity
#[derive(Debug, Clone)]
pub struct Body {
    id: EntityId,
    position: Position,
    radius: f64,
    min_radius: f64,
    membership: Membership,
}

impl Body {
    pub fn new(position: Position, radius: f64, min_radius: f64) -> Result<Self> {
        validate_position(position)?;
        validate_radius(radius, min_radius)?;
        Ok(Self {
            id: EntityId::next(),
            position,
            radius,
            min_radius,
            membership: Membership::Detached,
        })
    }

    pub fn set_position(&mut self, position: Position) -> Result<()> {
        validate_position(position)?;
        self.position = position;
        Ok(())
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        validate_radius(radius, self.min_radius)?;
        self.radius = radius;
        Ok(())
    }

    pub(crate) fn attach(&mut self, world: WorldId) -> Result<()> {
        match self.membership {
            Membership::Detached => {
                self.membership = Membership::Member(world);
                Ok(())
            }
            Membership::Member(other) if other == world => Err(Error::InvalidState(format!(
                "{} is already in this world",
                self.id
            ))),
            Membership::Member(_) => Err(Error::InvalidState(format!(
                "{} belongs to another world",
                self.id
            ))),
            Membership::Terminated => Err(Error::InvalidState(format!(
                "{} is terminated",
                self.id
            ))),
        }
    }

    pub(crate) fn detach(&mut self) {
        if let Membership::Member(_) = self.membership {
            self.membership = Membership::Detached;
        }
    }

    /// Terminate a detached entity; members must be removed from their world first
    pub fn terminate(&mut self) -> Result<()> {
        match self.membership {
            Membership::Detached => {
                self.membership = Membership::Terminated;
                Ok(())
            }
            Membership::Member(_) => Err(Error::InvalidState(format!(
                "{} is still listed by its world",
                self.id
            ))),
            Membership::Terminated => Err(Error::InvalidState(format!(
                "{} is already terminated",
                self.id
            ))),
        }
    }
}

fn validate_position(position: Position) -> Result<()> {
    if !position.is_valid() {
        return Err(Error::InvalidArgument(format!(
            "illegal position {}",
            position
        )));
    }
    Ok(())
}

fn validate_radius(radius: f64, min_radius: f64) -> Result<()> {
    if !radius.is_finite() || radius < min_radius {
        return Err(Error::InvalidArgument(format!(
            "illegal radius {} (minimum {})",
            radius, min_radius
        )));
    }
    Ok(())
}

/// Anything with a place in the world
pub trait Placed {
    fn body(&self) -> &Body;

    fn kind(&self) -> EntityKind;

    fn id(&self) -> EntityId {
        self.body().id
    }

    fn position(&self) -> Position {
        self.body().position
    }

    fn radius(&self) -> f64 {
        self.body().radius
    }

    fn membership(&self) -> Membership {
        self.body().membership
    }

    fn world(&self) -> Option<WorldId> {
        match self.body().membership {
            Membership::Member(world) => Some(world),
            _ => None,
        }
    }

    fn is_terminated(&self) -> bool {
        self.body().membership == Membership::Terminated
    }

    /// Whether the two discs overlap; touching rims do not count
    fn overlaps(&self, position: Position, radius: f64) -> bool {
        let reach = self.radius() + radius;
        self.position().squared_distance(&position) < reach * reach
    }
}

/// Entities with mass and a facing direction, which can be launched
pub trait Massive: Placed {
    fn direction(&self) -> f64;

    fn density(&self) -> f64;

    /// Force pushing the entity off when it jumps (N)
    fn jump_force(&self) -> f64;

    fn mass(&self) -> f64 {
        physics::sphere_mass(self.density(), self.radius())
    }

    fn ballistic(&self) -> Ballistic {
        Ballistic::new(self.position(), self.jump_force(), self.mass(), self.direction())
    }

    /// Position `t` seconds into a jump, clamped to the flight time
    fn jump_step(&self, t: f64) -> Result<Position> {
        self.ballistic().step(t)
    }
}

/// An entity handed back by the world when it lets go of it
#[derive(Debug, Clone)]
pub enum Entity {
    Worm(Worm),
    Food(Food),
    Projectile(Projectile),
}

impl Placed for Entity {
    fn body(&self) -> &Body {
        match self {
            Entity::Worm(worm) => worm.body(),
            Entity::Food(food) => food.body(),
            Entity::Projectile(projectile) => projectile.body(),
        }
    }

    fn kind(&self) -> EntityKind {
        match self {
            Entity::Worm(_) => EntityKind::Worm,
            Entity::Food(_) => EntityKind::Food,
            Entity::Projectile(_) => EntityKind::Projectile,
        }
    }
}
