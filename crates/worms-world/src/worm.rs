//! Worms: the massive, program-drivable combatants.

use crate::entity::{Body, Massive, Placed};
use crate::projectile::WeaponKind;
use std::f64::consts::PI;
use worms_core::{
    is_valid_direction, normalize_direction, normalize_turn, EntityKind, Error, Position, Result, WormConfig,
    GRAVITY,
};
use worms_runtime::ProgramInstance;

#[derive(Debug, Clone)]
pub struct Worm {
    body: Body,
    name: String,
    direction: f64,
    action_points: u32,
    hit_points: u32,
    team: Option<String>,
    weapon: WeaponKind,
    program: Option<ProgramInstance>,
    config: WormConfig,
}

impl Worm {
    /// A detached worm with full action and hit points
    pub fn new(
        name: &str,
        position: Position,
        direction: f64,
        radius: f64,
        config: &WormConfig,
    ) -> Result<Self> {
        validate_name(name)?;
        validate_direction(direction)?;
        let mut worm = Self {
            body: Body::new(position, radius, config.min_radius)?,
            name: name.to_string(),
            direction,
            action_points: 0,
            hit_points: 0,
            team: None,
            weapon: WeaponKind::default(),
            program: None,
            config: config.clone(),
        };
        worm.action_points = worm.max_action_points();
        worm.hit_points = worm.max_hit_points();
        Ok(worm)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn set_direction(&mut self, direction: f64) -> Result<()> {
        validate_direction(direction)?;
        self.direction = direction;
        Ok(())
    }

    pub fn action_points(&self) -> u32 {
        self.action_points
    }

    pub fn max_action_points(&self) -> u32 {
        self.mass().round() as u32
    }

    pub fn hit_points(&self) -> u32 {
        self.hit_points
    }

    pub fn max_hit_points(&self) -> u32 {
        self.mass().round() as u32
    }

    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    pub(crate) fn set_team(&mut self, team: Option<String>) {
        self.team = team;
    }

    pub fn weapon(&self) -> WeaponKind {
        self.weapon
    }

    pub fn select_next_weapon(&mut self) {
        self.weapon = self.weapon.next();
    }

    pub fn program(&self) -> Option<&ProgramInstance> {
        self.program.as_ref()
    }

    /// Attach a program, rebinding it to this worm
    pub fn attach_program(&mut self, mut program: ProgramInstance) {
        program.bind(self.id());
        self.program = Some(program);
    }

    pub(crate) fn take_program(&mut self) -> Option<ProgramInstance> {
        self.program.take()
    }

    pub(crate) fn restore_program(&mut self, program: ProgramInstance) {
        self.program = Some(program);
    }

    /// Action points a turn by `angle` radians costs.
    ///
    /// Turns are charged the short way round, so 3π/2 costs as much as π/2.
    pub fn turn_cost(&self, angle: f64) -> Result<u32> {
        if !angle.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "illegal turn angle {}",
                angle
            )));
        }
        let cost = self.config.turn_cost_full_circle * normalize_turn(angle).abs() / (2.0 * PI);
        Ok(ceil_cost(cost))
    }

    pub fn can_turn(&self, angle: f64) -> bool {
        self.turn_cost(angle)
            .map_or(false, |cost| cost <= self.action_points)
    }

    pub fn turn(&mut self, angle: f64) -> Result<()> {
        let cost = self.turn_cost(angle)?;
        self.spend(cost)?;
        self.direction = normalize_direction(self.direction + angle);
        Ok(())
    }

    /// Deduct action points, failing without effect when short
    pub fn spend(&mut self, cost: u32) -> Result<()> {
        if cost > self.action_points {
            return Err(Error::InvalidState(format!(
                "{} needs {} action points but has {}",
                self.name, cost, self.action_points
            )));
        }
        self.action_points -= cost;
        Ok(())
    }

    pub(crate) fn drain_action_points(&mut self) {
        self.action_points = 0;
    }

    /// Lose hit points; returns whether the worm survives
    pub fn damage(&mut self, amount: u32) -> bool {
        self.hit_points = self.hit_points.saturating_sub(amount);
        self.is_alive()
    }

    /// Start-of-turn refresh: full action points and some health back
    pub fn replenish(&mut self) {
        self.action_points = self.max_action_points();
        self.hit_points = (self.hit_points + self.config.hit_point_regen).min(self.max_hit_points());
    }

    pub fn set_position(&mut self, position: Position) -> Result<()> {
        self.body.set_position(position)
    }

    /// Grow after eating; points stay put while their maxima grow
    pub fn grow(&mut self) -> Result<()> {
        let radius = self.radius() * self.config.growth_factor;
        self.body.set_radius(radius)?;
        self.action_points = self.action_points.min(self.max_action_points());
        self.hit_points = self.hit_points.min(self.max_hit_points());
        Ok(())
    }

    pub fn config(&self) -> &WormConfig {
        &self.config
    }

    pub(crate) fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Placed for Worm {
    fn body(&self) -> &Body {
        &self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Worm
    }
}

impl Massive for Worm {
    fn direction(&self) -> f64 {
        self.direction
    }

    fn density(&self) -> f64 {
        self.config.density
    }

    fn jump_force(&self) -> f64 {
        self.config.jump_force_per_action_point * f64::from(self.action_points) + self.mass() * GRAVITY
    }
}

/// Round a fractional cost up, ignoring floating-point noise
pub(crate) fn ceil_cost(cost: f64) -> u32 {
    (cost - 1e-9).ceil().max(0.0) as u32
}

/// Worm names start with a capital, are at least two characters long and
/// hold letters, digits, spaces and quotes only
pub fn is_valid_worm_name(name: &str) -> bool {
    name.chars().count() >= 2
        && name.chars().next().map_or(false, char::is_uppercase)
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '\'' || c == '"')
}

fn validate_name(name: &str) -> Result<()> {
    if !is_valid_worm_name(name) {
        return Err(Error::InvalidArgument(format!(
            "illegal worm name '{}'",
            name
        )));
    }
    Ok(())
}

fn validate_direction(direction: f64) -> Result<()> {
    if !is_valid_direction(direction) {
        return Err(Error::InvalidArgument(format!(
            "illegal direction {}",
            direction
        )));
    }
    Ok(())
}
