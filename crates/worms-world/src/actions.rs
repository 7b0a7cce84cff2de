//! Worm commands: turning, moving, falling, eating, jumping and firing.
//!
//! Every command deducts its action points together with its effect, so a
//! failed command leaves the world untouched.

use crate::entity::{Massive, Placed};
use crate::grid::Location;
use crate::projectile::{validate_yield, Projectile, WeaponKind};
use crate::world::World;
use crate::worm::{ceil_cost, Worm};
use serde::Serialize;
use tracing::debug;
use worms_core::physics::{sample_count, validate_time_step};
use worms_core::{EntityId, Error, Position, Result};

/// Where a projectile flight ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "impact", rename_all = "snake_case")]
pub enum Impact {
    Worm {
        target: EntityId,
        position: Position,
        killed: bool,
    },
    Terrain {
        position: Position,
    },
    OutOfWorld {
        position: Position,
    },
}

impl Impact {
    pub fn position(&self) -> Position {
        match self {
            Impact::Worm { position, .. }
            | Impact::Terrain { position }
            | Impact::OutOfWorld { position } => *position,
        }
    }
}

/// End of a sampled worm jump
#[derive(Debug, Clone, Copy, PartialEq)]
enum Landing {
    Ground { position: Position, time: f64 },
    Exit { position: Position, time: f64 },
}

impl Landing {
    fn position(&self) -> Position {
        match self {
            Landing::Ground { position, .. } | Landing::Exit { position, .. } => *position,
        }
    }

    fn time(&self) -> f64 {
        match self {
            Landing::Ground { time, .. } | Landing::Exit { time, .. } => *time,
        }
    }
}

impl World {
    /// Terrain classification of a worm's current disc
    pub fn location_of(&self, worm: EntityId) -> Result<Location> {
        let worm = self.require_worm(worm)?;
        self.grid.classify(worm.position(), worm.radius())
    }

    // ----- turning and weapons -----

    pub fn turn_worm(&mut self, worm: EntityId, angle: f64) -> Result<()> {
        let worm = self.require_worm_mut(worm)?;
        worm.turn(angle)?;
        debug!(event = "worm_turned", worm = %worm.id(), angle, direction = worm.direction(), action_points = worm.action_points());
        Ok(())
    }

    pub fn select_next_weapon(&mut self, worm: EntityId) -> Result<()> {
        let worm = self.require_worm_mut(worm)?;
        worm.select_next_weapon();
        debug!(event = "weapon_selected", worm = %worm.id(), weapon = %worm.weapon());
        Ok(())
    }

    // ----- moving -----

    /// Where a move would take the worm, if anywhere.
    ///
    /// Candidates fan out from the facing direction and shrink from one
    /// radius towards the minimum move; the longest step that ends in
    /// contact with terrain wins, ties going to the smaller divergence.
    /// Without any contact the worm steps straight ahead into open air.
    pub fn planned_move(&self, worm: EntityId) -> Result<Option<Position>> {
        let worm = self.require_worm(worm)?;
        let config = worm.config();
        let step = config.search_step_fraction;
        sample_count(1.0 - config.min_move_fraction, step)?;
        sample_count(config.max_move_divergence, config.move_divergence_step)?;

        let origin = worm.position();
        let radius = worm.radius();
        let distances = ((1.0 - config.min_move_fraction) / step).round().max(0.0) as usize;
        let divergences =
            (config.max_move_divergence / config.move_divergence_step + 1e-9).floor().max(0.0) as usize;

        for k in 0..=distances {
            let distance = radius * (1.0 - k as f64 * step);
            for j in 0..=divergences {
                let divergence = j as f64 * config.move_divergence_step;
                for signed in [divergence, -divergence] {
                    if j == 0 && signed < 0.0 {
                        continue;
                    }
                    let candidate = origin.towards(worm.direction() + signed, distance);
                    if self.grid.classify(candidate, radius)? == Location::Contact {
                        return Ok(Some(candidate));
                    }
                }
            }
        }

        for k in 0..=distances {
            let distance = radius * (1.0 - k as f64 * step);
            let candidate = origin.towards(worm.direction(), distance);
            if self.grid.classify(candidate, radius)? == Location::Passable {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Action points a move to `target` costs; steeper moves cost more
    pub fn move_cost(&self, worm: EntityId, target: Position) -> Result<u32> {
        let worm = self.require_worm(worm)?;
        let slope = worm.position().bearing_to(&target);
        Ok(ceil_cost(slope.cos().abs() + (4.0 * slope.sin()).abs()))
    }

    pub fn can_move(&self, worm: EntityId) -> bool {
        let Ok(Some(target)) = self.planned_move(worm) else {
            return false;
        };
        match (self.move_cost(worm, target), self.worm(worm)) {
            (Ok(cost), Some(w)) => cost <= w.action_points(),
            _ => false,
        }
    }

    /// Move one step, then eat and fall as the new spot demands.
    ///
    /// A worm moved out of the world dies.
    pub fn move_worm(&mut self, id: EntityId) -> Result<()> {
        let target = self
            .planned_move(id)?
            .ok_or_else(|| Error::InvalidState(format!("{} has nowhere to move", id)))?;
        let cost = self.move_cost(id, target)?;
        let worm = self.require_worm(id)?;
        // a fall from the new spot must be searchable before the move is paid for
        sample_count(target.y.max(0.0), worm.radius() * worm.config().search_step_fraction)?;

        let worm = self.require_worm_mut(id)?;
        let from = worm.position();
        worm.spend(cost)?;
        worm.set_position(target)?;
        let radius = worm.radius();
        debug!(event = "worm_moved", worm = %id, from = %from, to = %target, cost);

        if !self.grid.is_inside(target, radius) {
            return self.kill_worm(id, "moved out of the world");
        }
        self.eat(id)?;
        if self.can_fall(id) {
            self.fall(id)?;
        }
        Ok(())
    }

    // ----- falling and eating -----

    /// Whether the worm hangs in open air inside the world
    pub fn can_fall(&self, worm: EntityId) -> bool {
        self.worm(worm).map_or(false, |w| {
            self.grid.is_inside(w.position(), w.radius())
                && matches!(self.grid.classify(w.position(), w.radius()), Ok(Location::Passable))
        })
    }

    /// Drop straight down until the worm touches terrain.
    ///
    /// Costs hit points per metre fallen; falling out of the bottom of the
    /// world is fatal.
    pub fn fall(&mut self, id: EntityId) -> Result<()> {
        if !self.can_fall(id) {
            return Err(Error::InvalidState(format!("{} cannot fall", id)));
        }
        let worm = self.require_worm(id)?;
        let start = worm.position();
        let radius = worm.radius();
        let step = radius * worm.config().search_step_fraction;
        let damage_per_metre = worm.config().fall_damage_per_metre;
        // below height zero every disc is out of the world
        let samples = sample_count(start.y.max(0.0), step)?;

        let mut landed = start;
        let mut k = 1u64;
        loop {
            if k > samples {
                return Err(Error::InvalidState(format!("{} never stopped falling", id)));
            }
            let candidate = Position::new(start.x, start.y - k as f64 * step);
            if !self.grid.is_inside(candidate, radius) {
                debug!(event = "worm_fell", worm = %id, from = %start, out_of_world = true);
                return self.kill_worm(id, "fell out of the world");
            }
            match self.grid.classify(candidate, radius)? {
                Location::Passable => landed = candidate,
                Location::Contact => {
                    landed = candidate;
                    break;
                }
                Location::Impassable => break,
            }
            k += 1;
        }

        let distance = start.y - landed.y;
        let damage = (damage_per_metre * distance).floor().max(0.0) as u32;
        let worm = self.require_worm_mut(id)?;
        worm.set_position(landed)?;
        let alive = worm.damage(damage);
        debug!(event = "worm_fell", worm = %id, from = %start, to = %landed, damage);

        if !alive {
            return self.kill_worm(id, "fall damage");
        }
        self.eat(id)?;
        Ok(())
    }

    /// Eat every food ration the worm overlaps, growing once per ration
    pub fn eat(&mut self, id: EntityId) -> Result<usize> {
        let worm = self.require_worm(id)?;
        let (position, radius) = (worm.position(), worm.radius());
        let eaten: Vec<EntityId> = self
            .food
            .values()
            .filter(|food| food.overlaps(position, radius))
            .map(Placed::id)
            .collect();

        for food in &eaten {
            self.remove_food(*food)?;
            let worm = self.require_worm_mut(id)?;
            worm.grow()?;
            debug!(event = "food_eaten", worm = %id, food = %food, radius = worm.radius());
        }
        Ok(eaten.len())
    }

    // ----- jumping -----

    /// Sample a worm's jump until it lands, leaves the world or is blocked
    fn jump_landing(&self, worm: &Worm, time_step: f64) -> Result<Option<Landing>> {
        validate_time_step(time_step)?;
        let ballistic = worm.ballistic();
        if !ballistic.can_fly() {
            return Ok(None);
        }
        let start = worm.position();
        let radius = worm.radius();
        let samples = sample_count(ballistic.time_to_sink_below(0.0), time_step)?;

        let mut previous = (start, self.grid.classify(start, radius)?);
        let mut k = 1u64;
        loop {
            if k > samples {
                return Err(Error::InvalidState("jump never ended".to_string()));
            }
            let time = k as f64 * time_step;
            let sample = ballistic.position_at(time);
            if !self.grid.is_inside(sample, radius) {
                return Ok(Some(Landing::Exit {
                    position: sample,
                    time,
                }));
            }
            let location = self.grid.classify(sample, radius)?;
            match location {
                Location::Contact if sample.distance(&start) >= radius => {
                    return Ok(Some(Landing::Ground {
                        position: sample,
                        time,
                    }));
                }
                Location::Impassable => {
                    let (before, before_location) = previous;
                    if before.distance(&start) >= radius && before_location != Location::Impassable {
                        return Ok(Some(Landing::Ground {
                            position: before,
                            time: time - time_step,
                        }));
                    }
                    return Ok(None);
                }
                _ => {}
            }
            previous = (sample, location);
            k += 1;
        }
    }

    pub fn can_jump(&self, worm: EntityId) -> bool {
        self.can_jump_with(worm, self.config.time_step)
    }

    fn can_jump_with(&self, id: EntityId, time_step: f64) -> bool {
        let Some(worm) = self.worm(id) else {
            return false;
        };
        worm.action_points() > 0
            && !matches!(
                self.grid.classify(worm.position(), worm.radius()),
                Ok(Location::Impassable) | Err(_)
            )
            && matches!(self.jump_landing(worm, time_step), Ok(Some(_)))
    }

    /// Jump with the configured sampling step
    pub fn jump(&mut self, worm: EntityId) -> Result<()> {
        self.jump_worm(worm, self.config.time_step)
    }

    /// Jump, sampling the flight every `time_step` seconds.
    ///
    /// Spends every remaining action point.
    pub fn jump_worm(&mut self, id: EntityId, time_step: f64) -> Result<()> {
        validate_time_step(time_step)?;
        if !self.can_jump_with(id, time_step) {
            return Err(Error::InvalidState(format!("{} cannot jump from here", id)));
        }
        let worm = self.require_worm(id)?;
        let landing = self
            .jump_landing(worm, time_step)?
            .ok_or_else(|| Error::InvalidState(format!("{} cannot jump from here", id)))?;

        let worm = self.require_worm_mut(id)?;
        let from = worm.position();
        worm.drain_action_points();
        worm.set_position(landing.position())?;
        debug!(event = "worm_jumped", worm = %id, from = %from, to = %landing.position(), time = landing.time());

        match landing {
            Landing::Exit { .. } => self.kill_worm(id, "jumped out of the world"),
            Landing::Ground { .. } => self.eat(id).map(|_| ()),
        }
    }

    /// Sampled duration of the worm's jump
    pub fn jump_time(&self, id: EntityId, time_step: f64) -> Result<f64> {
        let worm = self.require_worm(id)?;
        self.jump_landing(worm, time_step)?
            .map(|landing| landing.time())
            .ok_or_else(|| Error::InvalidState(format!("{} cannot jump from here", id)))
    }

    // ----- firing -----

    /// Action points the worm's selected weapon costs, if it may fire at
    /// all from where it stands
    pub fn fire_cost(&self, id: EntityId, yield_percent: u32) -> Result<u32> {
        validate_yield(yield_percent)?;
        let worm = self.require_worm(id)?;
        if self.grid.classify(worm.position(), worm.radius())? == Location::Impassable {
            return Err(Error::InvalidState(format!(
                "{} cannot fire from inside terrain",
                id
            )));
        }
        Ok(worm.weapon().spec(&self.config.weapons).cost)
    }

    /// The shot the worm would fire and its cost; the world is not touched
    fn aim(&self, id: EntityId, yield_percent: u32) -> Result<(Projectile, u32)> {
        let cost = self.fire_cost(id, yield_percent)?;
        let worm = self.require_worm(id)?;
        if worm.action_points() < cost {
            return Err(Error::InvalidState(format!(
                "{} needs {} action points to fire but has {}",
                worm.name(),
                cost,
                worm.action_points()
            )));
        }

        let projectile = Projectile::new(
            worm.position().towards(worm.direction(), worm.radius()),
            worm.direction(),
            worm.weapon(),
            yield_percent,
            &self.config.weapons,
            Some(id),
        )?;
        Ok((projectile, cost))
    }

    fn launch(&mut self, id: EntityId, projectile: Projectile, cost: u32) -> Result<EntityId> {
        let weapon = projectile.weapon();
        let yield_percent = projectile.yield_percent();
        let projectile = self.set_projectile(projectile)?;
        self.require_worm_mut(id)?.spend(cost)?;
        debug!(event = "weapon_fired", worm = %id, projectile = %projectile, weapon = %weapon, yield_percent, cost);
        Ok(projectile)
    }

    /// Launch the selected weapon from the worm's rim.
    ///
    /// The projectile stays in flight until `resolve_projectile`.
    pub fn fire(&mut self, id: EntityId, yield_percent: u32) -> Result<EntityId> {
        let (projectile, cost) = self.aim(id, yield_percent)?;
        self.launch(id, projectile, cost)
    }

    /// Fire and fly the shot to its end.
    ///
    /// The flight is worked out before the shot is paid for, so a shot that
    /// cannot be flown leaves the worm and the world as they were.
    pub fn fire_and_resolve(
        &mut self,
        id: EntityId,
        yield_percent: u32,
        time_step: f64,
    ) -> Result<Impact> {
        let (projectile, cost) = self.aim(id, yield_percent)?;
        let (impact, time) = self.projectile_flight(&projectile, time_step)?;
        let weapon = projectile.weapon();
        self.launch(id, projectile, cost)?;
        self.land_projectile(impact, time, weapon)
    }

    /// Sample the live projectile's flight
    fn projectile_flight(&self, projectile: &Projectile, time_step: f64) -> Result<(Impact, f64)> {
        validate_time_step(time_step)?;
        let ballistic = projectile.ballistic();
        let start = projectile.position();
        let radius = projectile.radius();
        let samples = sample_count(ballistic.time_to_sink_below(0.0), time_step)?;

        let mut previous = start;
        let mut k = 1u64;
        loop {
            if k > samples {
                return Err(Error::InvalidState("projectile flight never ended".to_string()));
            }
            let time = k as f64 * time_step;
            let sample = ballistic.position_at(time);
            if !self.grid.is_inside(sample, radius) {
                return Ok((Impact::OutOfWorld { position: sample }, time));
            }
            let hit = self
                .worms
                .iter()
                .find(|w| Some(w.id()) != projectile.owner() && w.overlaps(sample, radius));
            if let Some(target) = hit {
                let impact = Impact::Worm {
                    target: target.id(),
                    position: sample,
                    killed: false,
                };
                return Ok((impact, time));
            }
            match self.grid.classify(sample, radius)? {
                Location::Impassable => {
                    return Ok((Impact::Terrain { position: previous }, time - time_step));
                }
                Location::Contact if sample.distance(&start) >= radius => {
                    return Ok((Impact::Terrain { position: sample }, time));
                }
                _ => {}
            }
            previous = sample;
            k += 1;
        }
    }

    /// Sampled flight time of the live projectile
    pub fn projectile_time(&self, time_step: f64) -> Result<f64> {
        let projectile = self
            .projectile
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no projectile in flight".to_string()))?;
        self.projectile_flight(projectile, time_step).map(|(_, time)| time)
    }

    /// Fly the live projectile to its end, damaging any worm it strikes,
    /// then remove it from the world
    pub fn resolve_projectile(&mut self, time_step: f64) -> Result<Impact> {
        let projectile = self
            .projectile
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no projectile in flight".to_string()))?;
        let (impact, time) = self.projectile_flight(projectile, time_step)?;
        let weapon = projectile.weapon();
        self.land_projectile(impact, time, weapon)
    }

    /// Apply a finished flight: damage the struck worm, drop the projectile
    fn land_projectile(&mut self, mut impact: Impact, time: f64, weapon: WeaponKind) -> Result<Impact> {
        let damage = weapon.spec(&self.config.weapons).damage;

        if let Impact::Worm { target, killed, .. } = &mut impact {
            let worm = self.require_worm_mut(*target)?;
            *killed = !worm.damage(damage);
            debug!(event = "worm_hit", worm = %target, damage, hit_points = worm.hit_points());
            if *killed {
                self.kill_worm(*target, "hit by a projectile")?;
            }
        }

        let projectile = self.remove_projectile()?;
        debug!(event = "projectile_landed", projectile = %projectile.id(), impact = ?impact, time);
        Ok(impact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TerrainGrid;
    use crate::food::Food;
    use crate::projectile::WeaponKind;
    use std::f64::consts::PI;
    use worms_core::{GameConfig, WormConfig};

    /// Solid ground below y = 3 in a 10 x 10 world
    fn flat_world() -> World {
        let mut lines = vec![".........."; 7];
        lines.extend(vec!["##########"; 3]);
        let grid = TerrainGrid::from_ascii(10.0, 10.0, &lines).unwrap();
        World::with_grid(grid, GameConfig::default()).unwrap()
    }

    fn add(world: &mut World, name: &str, x: f64, y: f64, direction: f64, radius: f64) -> EntityId {
        let worm = Worm::new(name, Position::new(x, y), direction, radius, &WormConfig::default()).unwrap();
        world.add_worm(worm).unwrap()
    }

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_turn_costs_points() {
        let mut world = flat_world();
        let id = add(&mut world, "Alpha", 5.0, 3.52, 0.0, 0.5);
        let before = world.worm(id).unwrap().action_points();
        world.turn_worm(id, 0.5).unwrap();
        let worm = world.worm(id).unwrap();
        assert_eq!(worm.action_points(), before - 5);
        assert!(close(worm.direction(), 0.5, 1e-12));
        assert!(world.turn_worm(id, f64::NAN).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_move_along_flat_ground() {
        let mut world = flat_world();
        let id = add(&mut world, "Alpha", 5.0, 3.52, 0.0, 0.5);
        assert_eq!(world.location_of(id).unwrap(), Location::Contact);

        let target = world.planned_move(id).unwrap().unwrap();
        assert!(close(target.x, 5.5, 1e-9));
        assert!(close(target.y, 3.52, 1e-9));
        assert_eq!(world.move_cost(id, target).unwrap(), 1);
        assert!(world.can_move(id));

        let before = world.worm(id).unwrap().action_points();
        world.move_worm(id).unwrap();
        let worm = world.worm(id).unwrap();
        assert_eq!(worm.position(), target);
        assert_eq!(worm.action_points(), before - 1);
    }

    #[test]
    fn test_move_eats_food() {
        let mut world = flat_world();
        let id = add(&mut world, "Alpha", 5.0, 3.52, 0.0, 0.5);
        let food = world
            .add_food(Food::new(Position::new(6.0, 3.3), &Default::default()).unwrap())
            .unwrap();

        world.move_worm(id).unwrap();
        assert!(world.food(food).is_none());
        assert!(close(world.worm(id).unwrap().radius(), 0.55, 1e-12));
    }

    #[test]
    fn test_move_without_points_fails_cleanly() {
        let mut world = flat_world();
        let id = add(&mut world, "Alpha", 5.0, 3.52, 0.0, 0.5);
        world.worm_mut(id).unwrap().drain_action_points();
        assert!(!world.can_move(id));
        assert!(world.move_worm(id).unwrap_err().is_invalid_state());
        assert_eq!(world.worm(id).unwrap().position(), Position::new(5.0, 3.52));
    }

    #[test]
    fn test_move_into_open_air_falls_out_of_world() {
        let mut world = World::new(10.0, 10.0, vec![], GameConfig::default()).unwrap();
        let id = add(&mut world, "Alpha", 5.0, 5.0, 0.0, 0.5);
        let target = world.planned_move(id).unwrap().unwrap();
        assert!(close(target.x, 5.5, 1e-9));

        world.move_worm(id).unwrap();
        assert!(world.worm(id).is_none());
    }

    #[test]
    fn test_fall_lands_on_floor_with_damage() {
        let mut lines = vec![".........."; 9];
        lines.push("##########");
        let grid = TerrainGrid::from_ascii(10.0, 10.0, &lines).unwrap();
        let mut world = World::with_grid(grid, GameConfig::default()).unwrap();
        let id = add(&mut world, "Alpha", 5.0, 6.0, 0.0, 0.5);
        let full = world.worm(id).unwrap().hit_points();

        assert!(world.can_fall(id));
        world.fall(id).unwrap();
        let worm = world.worm(id).unwrap();
        assert!(worm.position().y >= 1.5 && worm.position().y <= 1.56);
        assert_eq!(worm.hit_points(), full - 13);
        assert_eq!(world.location_of(id).unwrap(), Location::Contact);
        assert!(!world.can_fall(id));
        assert!(world.fall(id).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_jump_across_flat_ground() {
        let mut world = flat_world();
        let id = add(&mut world, "Alpha", 2.0, 3.52, PI / 4.0, 0.5);
        assert!(world.can_jump(id));

        let closed_form = world.worm(id).unwrap().ballistic().flight_time();
        let sampled = world.jump_time(id, 0.001).unwrap();
        assert!(close(sampled, closed_form, 0.05));

        world.jump(id).unwrap();
        let worm = world.worm(id).unwrap();
        assert_eq!(worm.action_points(), 0);
        assert!(worm.position().x > 6.5 && worm.position().x < 8.5);
        assert!(worm.position().y >= 3.5 && worm.position().y < 3.56);
        assert!(!world.can_jump(id));
    }

    #[test]
    fn test_jump_rejects_bad_time_step() {
        let mut world = flat_world();
        let id = add(&mut world, "Alpha", 2.0, 3.52, PI / 4.0, 0.5);
        assert!(world.jump_worm(id, 0.0).unwrap_err().is_invalid_argument());
        assert!(world.jump_time(id, f64::NAN).is_err());
    }

    #[test]
    fn test_fine_sampling_is_refused_up_front() {
        let mut world = flat_world();
        world.config.time_step = 1e-12;
        let id = add(&mut world, "Alpha", 2.0, 3.52, PI / 4.0, 0.5);
        let points = world.worm(id).unwrap().action_points();

        assert!(!world.can_jump(id));
        assert!(world.jump_time(id, 1e-12).unwrap_err().is_invalid_argument());
        assert!(world.jump(id).is_err());
        assert_eq!(world.worm(id).unwrap().action_points(), points);

        world.fire(id, 50).unwrap();
        assert!(world.resolve_projectile(1e-12).unwrap_err().is_invalid_argument());
        assert!(world.projectile().is_some());
    }

    #[test]
    fn test_fine_fall_step_is_refused() {
        let mut lines = vec![".........."; 9];
        lines.push("##########");
        let grid = TerrainGrid::from_ascii(10.0, 10.0, &lines).unwrap();
        let mut world = World::with_grid(grid, GameConfig::default()).unwrap();
        let config = WormConfig { search_step_fraction: 1e-12, ..WormConfig::default() };
        let worm = Worm::new("Alpha", Position::new(5.0, 6.0), 0.0, 0.5, &config).unwrap();
        let id = world.add_worm(worm).unwrap();

        assert!(world.can_fall(id));
        assert!(world.fall(id).unwrap_err().is_invalid_argument());
        assert_eq!(world.worm(id).unwrap().position(), Position::new(5.0, 6.0));
    }

    #[test]
    fn test_cannot_jump_resting_on_row_below() {
        // worm of radius 1 at (5, 5) facing up, solid row spanning y in [3, 4]
        let mut lines = vec![".........."; 10];
        lines[6] = "##########";
        let grid = TerrainGrid::from_ascii(10.0, 10.0, &lines).unwrap();
        let mut world = World::with_grid(grid, GameConfig::default()).unwrap();
        let id = add(&mut world, "Shorty", 5.0, 5.0, PI / 2.0, 1.0);

        assert_eq!(world.location_of(id).unwrap(), Location::Contact);
        assert!(!world.can_jump(id));
        assert!(world.jump(id).unwrap_err().is_invalid_state());
        assert_eq!(world.worm(id).unwrap().position(), Position::new(5.0, 5.0));
    }

    #[test]
    fn test_cannot_jump_from_inside_row() {
        // solid row spanning y in [4, 5] cuts through the worm
        let mut lines = vec![".........."; 10];
        lines[5] = "##########";
        let grid = TerrainGrid::from_ascii(10.0, 10.0, &lines).unwrap();
        let mut world = World::with_grid(grid, GameConfig::default()).unwrap();
        let id = add(&mut world, "Shorty", 5.0, 5.0, PI / 2.0, 1.0);

        assert_eq!(world.location_of(id).unwrap(), Location::Impassable);
        assert!(!world.can_jump(id));
        assert!(world.jump(id).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_rifle_hits_other_worm() {
        let mut world = flat_world();
        let shooter = add(&mut world, "Alpha", 2.0, 3.52, 0.0, 0.5);
        let target = add(&mut world, "Beta", 5.0, 3.52, PI, 0.5);
        let full = world.worm(target).unwrap().hit_points();
        let points = world.worm(shooter).unwrap().action_points();

        let projectile = world.fire(shooter, 50).unwrap();
        assert_eq!(world.projectile().map(Placed::id), Some(projectile));
        assert_eq!(world.worm(shooter).unwrap().action_points(), points - 10);

        let impact = world.resolve_projectile(0.001).unwrap();
        assert!(matches!(
            impact,
            Impact::Worm { target: hit, killed: false, .. } if hit == target
        ));
        assert_eq!(world.worm(target).unwrap().hit_points(), full - 20);
        assert!(world.projectile().is_none());
        assert!(!world.contains(projectile));
    }

    #[test]
    fn test_fire_and_resolve_pays_only_for_a_flight() {
        let mut world = flat_world();
        let shooter = add(&mut world, "Alpha", 2.0, 3.52, 0.0, 0.5);
        let target = add(&mut world, "Beta", 5.0, 3.52, PI, 0.5);
        let full = world.worm(target).unwrap().hit_points();
        let points = world.worm(shooter).unwrap().action_points();

        assert!(world.fire_and_resolve(shooter, 50, 0.0).unwrap_err().is_invalid_argument());
        assert_eq!(world.worm(shooter).unwrap().action_points(), points);
        assert!(world.projectile().is_none());

        let impact = world.fire_and_resolve(shooter, 50, 0.001).unwrap();
        assert!(matches!(impact, Impact::Worm { target: hit, .. } if hit == target));
        assert_eq!(world.worm(shooter).unwrap().action_points(), points - 10);
        assert_eq!(world.worm(target).unwrap().hit_points(), full - 20);
        assert!(world.projectile().is_none());
    }

    #[test]
    fn test_bazooka_kills_weak_worm() {
        let mut world = flat_world();
        let shooter = add(&mut world, "Alpha", 2.0, 3.52, 0.0, 0.5);
        let target = add(&mut world, "Beta", 5.0, 3.52, PI, 0.5);
        world.select_next_weapon(shooter).unwrap();
        assert_eq!(world.worm(shooter).unwrap().weapon(), WeaponKind::Bazooka);
        let hp = world.worm(target).unwrap().hit_points();
        world.worm_mut(target).unwrap().damage(hp - 50);

        world.fire(shooter, 100).unwrap();
        let impact = world.resolve_projectile(0.001).unwrap();
        assert!(matches!(impact, Impact::Worm { killed: true, .. }));
        assert!(world.worm(target).is_none());
    }

    #[test]
    fn test_shot_into_ground_hits_terrain() {
        let mut world = flat_world();
        let shooter = add(&mut world, "Alpha", 2.0, 3.52, 5.0, 0.5);
        world.fire(shooter, 0).unwrap();
        let impact = world.resolve_projectile(0.001).unwrap();
        assert!(matches!(impact, Impact::Terrain { .. }));
        assert!(impact.position().y >= 3.0);
    }

    #[test]
    fn test_shot_in_open_air_leaves_world() {
        let mut world = World::new(10.0, 10.0, vec![], GameConfig::default()).unwrap();
        let shooter = add(&mut world, "Alpha", 5.0, 5.0, PI / 3.0, 0.5);
        world.fire(shooter, 30).unwrap();
        assert!(world.projectile_time(0.001).unwrap() > 0.0);
        assert!(matches!(
            world.resolve_projectile(0.001).unwrap(),
            Impact::OutOfWorld { .. }
        ));
    }

    #[test]
    fn test_fire_preconditions() {
        let mut world = flat_world();
        let shooter = add(&mut world, "Alpha", 2.0, 3.52, 0.0, 0.5);
        assert!(world.fire(shooter, 101).unwrap_err().is_invalid_argument());

        let spare = world.worm(shooter).unwrap().action_points() - 5;
        world.worm_mut(shooter).unwrap().spend(spare).unwrap();
        assert!(world.fire(shooter, 50).unwrap_err().is_invalid_state());
        assert!(world.projectile().is_none());

        assert!(world.resolve_projectile(0.001).unwrap_err().is_invalid_state());
    }
}
