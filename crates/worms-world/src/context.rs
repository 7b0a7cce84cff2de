//! Programs acting on the world.

use crate::entity::{Massive, Placed};
use crate::world::World;
use tracing::{debug, instrument, warn};
use worms_core::{EntityId, EntityKind, Error, Position, Result};
use worms_program::{EntityFilter, Property};
use worms_runtime::{ProgramContext, RunOutcome, WormAction};

impl ProgramContext for World {
    fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        if self.worm(id).is_some() {
            Some(EntityKind::Worm)
        } else if self.food(id).is_some() {
            Some(EntityKind::Food)
        } else {
            None
        }
    }

    fn position_of(&self, id: EntityId) -> Option<Position> {
        self.worm(id)
            .map(Placed::position)
            .or_else(|| self.food(id).map(Placed::position))
    }

    fn radius_of(&self, id: EntityId) -> Option<f64> {
        self.worm(id)
            .map(Placed::radius)
            .or_else(|| self.food(id).map(Placed::radius))
    }

    fn inspect(&self, id: EntityId, property: Property) -> Result<f64> {
        if let Some(worm) = self.worm(id) {
            return Ok(match property {
                Property::X => worm.position().x,
                Property::Y => worm.position().y,
                Property::Radius => worm.radius(),
                Property::Direction => worm.direction(),
                Property::ActionPoints => f64::from(worm.action_points()),
                Property::MaxActionPoints => f64::from(worm.max_action_points()),
                Property::HitPoints => f64::from(worm.hit_points()),
                Property::MaxHitPoints => f64::from(worm.max_hit_points()),
            });
        }

        let food = self.food(id).ok_or_else(|| {
            Error::InvalidArgument(format!("{} is not in this world", id))
        })?;
        match property {
            Property::X => Ok(food.position().x),
            Property::Y => Ok(food.position().y),
            Property::Radius => Ok(food.radius()),
            other => Err(Error::InvalidArgument(format!(
                "food has no {:?}",
                other
            ))),
        }
    }

    fn team_of(&self, id: EntityId) -> Option<String> {
        self.worm(id).and_then(|w| w.team().map(str::to_string))
    }

    /// Worms in turn order, then food in id order
    fn entities(&self, filter: EntityFilter) -> Vec<EntityId> {
        let worms = self.worms().iter().map(Placed::id);
        let food = self.food_rations().map(Placed::id);
        match filter {
            EntityFilter::Worm => worms.collect(),
            EntityFilter::Food => food.collect(),
            EntityFilter::Any => worms.chain(food).collect(),
        }
    }

    fn action_points(&self, worm: EntityId) -> Result<u32> {
        Ok(self.require_worm(worm)?.action_points())
    }

    fn action_cost(&self, id: EntityId, action: &WormAction) -> Result<u32> {
        let worm = self.require_worm(id)?;
        match *action {
            WormAction::Turn { angle } => worm.turn_cost(angle),
            WormAction::Move => {
                let target = self
                    .planned_move(id)?
                    .ok_or_else(|| Error::InvalidState(format!("{} has nowhere to move", id)))?;
                self.move_cost(id, target)
            }
            // A spent worm must wait for its next turn rather than skip the jump
            WormAction::Jump if worm.action_points() == 0 => Ok(1),
            WormAction::Jump => {
                if self.can_jump(id) {
                    Ok(worm.action_points())
                } else {
                    Err(Error::InvalidState(format!("{} cannot jump from here", id)))
                }
            }
            WormAction::Fire { yield_percent } => self.fire_cost(id, yield_percent),
            WormAction::ToggleWeapon => Ok(0),
        }
    }

    fn perform(&mut self, id: EntityId, action: WormAction) -> Result<()> {
        match action {
            WormAction::Turn { angle } => self.turn_worm(id, angle),
            WormAction::Move => self.move_worm(id),
            WormAction::Jump => self.jump(id),
            WormAction::Fire { yield_percent } => {
                let impact = self.fire_and_resolve(id, yield_percent, self.config.time_step)?;
                debug!(event = "program_shot_resolved", worm = %id, impact = ?impact);
                Ok(())
            }
            WormAction::ToggleWeapon => self.select_next_weapon(id),
        }
    }
}

impl World {
    /// Drive the worm's program once.
    ///
    /// The program is lifted out of the worm while it runs and handed back
    /// if the worm survives. Returns `None` for a worm without a program.
    #[instrument(skip(self), fields(world = %self.id()))]
    pub fn run_program(&mut self, worm: EntityId) -> Result<Option<RunOutcome>> {
        let mut program = match self.require_worm_mut(worm)?.take_program() {
            Some(program) => program,
            None => return Ok(None),
        };

        let result = program.run(self);
        if let Some(owner) = self.worm_mut(worm) {
            owner.restore_program(program);
        }

        match result {
            Ok(outcome) => Ok(Some(outcome)),
            Err(err) => {
                warn!(event = "program_failed", worm = %worm, error = %err);
                Err(err)
            }
        }
    }

    /// Drive the program of the worm whose turn it is
    pub fn run_current_program(&mut self) -> Result<Option<RunOutcome>> {
        let worm = self
            .current_worm()
            .map(Placed::id)
            .ok_or_else(|| Error::InvalidState("no worm has the turn".to_string()))?;
        self.run_program(worm)
    }
}
