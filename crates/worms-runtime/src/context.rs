//! The seam between running programs and the world they act in.

use worms_core::{EntityId, EntityKind, Position, Result};
use worms_program::{EntityFilter, Property};

/// A costed worm action, with its arguments already evaluated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WormAction {
    Turn { angle: f64 },
    Move,
    Jump,
    Fire { yield_percent: u32 },
    ToggleWeapon,
}

impl WormAction {
    pub fn name(&self) -> &'static str {
        match self {
            WormAction::Turn { .. } => "turn",
            WormAction::Move => "move",
            WormAction::Jump => "jump",
            WormAction::Fire { .. } => "fire",
            WormAction::ToggleWeapon => "toggle_weapon",
        }
    }
}

/// Everything a program may observe or change while it runs.
///
/// Lookups return `None` for entities that are not part of the world.
/// `perform` deducts the action's cost together with its effect.
pub trait ProgramContext {
    fn kind_of(&self, id: EntityId) -> Option<EntityKind>;

    fn position_of(&self, id: EntityId) -> Option<Position>;

    fn radius_of(&self, id: EntityId) -> Option<f64>;

    /// Numeric property of an entity; worm-only properties fail on food
    fn inspect(&self, id: EntityId, property: Property) -> Result<f64>;

    fn team_of(&self, id: EntityId) -> Option<String>;

    /// Live entities matching `filter`, in a reproducible order
    fn entities(&self, filter: EntityFilter) -> Vec<EntityId>;

    fn action_points(&self, worm: EntityId) -> Result<u32>;

    /// Action points `action` would cost right now.
    ///
    /// Fails when the action cannot be planned at all.
    fn action_cost(&self, worm: EntityId, action: &WormAction) -> Result<u32>;

    fn perform(&mut self, worm: EntityId, action: WormAction) -> Result<()>;
}
