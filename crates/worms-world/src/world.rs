//! The world: owning registry of entities plus turn state.

use crate::entity::{Entity, Placed};
use crate::food::Food;
use crate::grid::{Location, TerrainGrid};
use crate::projectile::Projectile;
use crate::team::Team;
use crate::worm::Worm;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use tracing::{debug, info, instrument, warn};
use worms_core::physics::sample_count;
use worms_core::{EntityId, Error, GameConfig, Position, Result, WorldId};
use worms_runtime::ProgramInstance;

/// Whose turn it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    /// Index of the current worm in turn order
    pub index: usize,
    /// 1 for the first turn of the game
    pub number: u64,
    /// The current worm left the world; `index` now names its successor
    pub current_removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldState {
    NotStarted,
    InProgress(Turn),
    Finished,
    Terminated,
}

/// The side left standing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Winner {
    Team(String),
    Worm(String),
}

/// What competes for the win: a team, or a worm without one
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Faction<'a> {
    Team(&'a str),
    Solo(EntityId),
}

#[derive(Debug)]
pub struct World {
    pub(crate) id: WorldId,
    pub(crate) grid: TerrainGrid,
    pub(crate) config: GameConfig,
    /// Turn order
    pub(crate) worms: Vec<Worm>,
    pub(crate) food: BTreeMap<EntityId, Food>,
    pub(crate) projectile: Option<Projectile>,
    teams: Vec<Team>,
    pub(crate) rng: ChaCha8Rng,
    state: WorldState,
}

impl World {
    /// Create a world from a passable map (rows top to bottom)
    pub fn new(width: f64, height: f64, map: Vec<Vec<bool>>, config: GameConfig) -> Result<Self> {
        let grid = TerrainGrid::new(width, height, map)?;
        Self::with_grid(grid, config)
    }

    /// Create a world on an existing grid; fails on an unusable config
    pub fn with_grid(grid: TerrainGrid, config: GameConfig) -> Result<Self> {
        config.validate()?;
        let grid = grid.with_contact_inflation(config.terrain.contact_inflation);
        let id = WorldId::new();
        info!(
            event = "world_created",
            world = %id,
            width = grid.width(),
            height = grid.height(),
            rows = grid.rows(),
            cols = grid.cols(),
            seed = config.seed
        );

        Ok(Self {
            id,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            grid,
            config,
            worms: Vec::new(),
            food: BTreeMap::new(),
            projectile: None,
            teams: Vec::new(),
            state: WorldState::NotStarted,
        })
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn width(&self) -> f64 {
        self.grid.width()
    }

    pub fn height(&self) -> f64 {
        self.grid.height()
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> WorldState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == WorldState::Terminated
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.state, WorldState::InProgress(_))
    }

    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }

    pub fn worm(&self, id: EntityId) -> Option<&Worm> {
        self.worms.iter().find(|w| w.id() == id)
    }

    pub(crate) fn worm_mut(&mut self, id: EntityId) -> Option<&mut Worm> {
        self.worms.iter_mut().find(|w| w.id() == id)
    }

    pub(crate) fn require_worm(&self, id: EntityId) -> Result<&Worm> {
        self.worm(id)
            .ok_or_else(|| Error::InvalidState(format!("{} is not a worm in this world", id)))
    }

    pub(crate) fn require_worm_mut(&mut self, id: EntityId) -> Result<&mut Worm> {
        self.worm_mut(id)
            .ok_or_else(|| Error::InvalidState(format!("{} is not a worm in this world", id)))
    }

    /// Food rations in id order
    pub fn food_rations(&self) -> impl Iterator<Item = &Food> + '_ {
        self.food.values()
    }

    pub fn food(&self, id: EntityId) -> Option<&Food> {
        self.food.get(&id)
    }

    pub fn projectile(&self) -> Option<&Projectile> {
        self.projectile.as_ref()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name() == name)
    }

    /// Worms of a team, in turn order
    pub fn team_members(&self, name: &str) -> Vec<EntityId> {
        self.worms
            .iter()
            .filter(|w| w.team() == Some(name))
            .map(Placed::id)
            .collect()
    }

    /// Whether any entity with this id is registered
    pub fn contains(&self, id: EntityId) -> bool {
        self.worm(id).is_some()
            || self.food.contains_key(&id)
            || self.projectile.as_ref().map_or(false, |p| p.id() == id)
    }

    pub fn current_worm(&self) -> Option<&Worm> {
        match self.state {
            WorldState::InProgress(turn) if !turn.current_removed => self.worms.get(turn.index),
            _ => None,
        }
    }

    pub fn turn_number(&self) -> Option<u64> {
        match self.state {
            WorldState::InProgress(turn) => Some(turn.number),
            _ => None,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_terminated() {
            return Err(Error::InvalidState(format!("world {} is terminated", self.id)));
        }
        Ok(())
    }

    fn ensure_registrable(&self, entity: &dyn Placed) -> Result<()> {
        self.ensure_open()?;
        if entity.is_terminated() {
            return Err(Error::InvalidState(format!(
                "{} is terminated",
                entity.id()
            )));
        }
        if self.contains(entity.id()) {
            return Err(Error::InvalidState(format!(
                "{} is already in this world",
                entity.id()
            )));
        }
        Ok(())
    }

    // ----- registration -----

    pub fn add_worm(&mut self, mut worm: Worm) -> Result<EntityId> {
        self.ensure_registrable(&worm)?;
        if let Some(team) = worm.team() {
            if self.team(team).is_none() {
                return Err(Error::InvalidState(format!(
                    "team '{}' is not part of this world",
                    team
                )));
            }
        }
        worm.body_mut().attach(self.id)?;

        let id = worm.id();
        debug!(event = "worm_added", world = %self.id, worm = %id, name = worm.name(), position = %worm.position());
        self.worms.push(worm);
        Ok(id)
    }

    pub fn add_food(&mut self, mut food: Food) -> Result<EntityId> {
        self.ensure_registrable(&food)?;
        food.body_mut().attach(self.id)?;

        let id = food.id();
        debug!(event = "food_added", world = %self.id, food = %id, position = %food.position());
        self.food.insert(id, food);
        Ok(id)
    }

    /// Register the live projectile, terminating the one it replaces
    pub fn set_projectile(&mut self, mut projectile: Projectile) -> Result<EntityId> {
        self.ensure_registrable(&projectile)?;
        projectile.body_mut().attach(self.id)?;

        if self.projectile.is_some() {
            self.remove_projectile()?;
        }
        let id = projectile.id();
        debug!(event = "projectile_added", world = %self.id, projectile = %id, weapon = %projectile.weapon());
        self.projectile = Some(projectile);
        Ok(id)
    }

    pub fn add_team(&mut self, team: Team) -> Result<()> {
        self.ensure_open()?;
        if self.team(team.name()).is_some() {
            return Err(Error::InvalidArgument(format!(
                "team '{}' already exists",
                team.name()
            )));
        }
        if self.teams.len() >= self.config.spawn.max_teams {
            return Err(Error::InvalidState(format!(
                "a world holds at most {} teams",
                self.config.spawn.max_teams
            )));
        }
        debug!(event = "team_added", world = %self.id, team = team.name());
        self.teams.push(team);
        Ok(())
    }

    /// Make a worm of this world join an existing team
    pub fn join_team(&mut self, worm: EntityId, team: &str) -> Result<()> {
        if self.team(team).is_none() {
            return Err(Error::InvalidArgument(format!("no team named '{}'", team)));
        }
        self.require_worm_mut(worm)?.set_team(Some(team.to_string()));
        Ok(())
    }

    // ----- removal -----

    pub fn remove_worm(&mut self, id: EntityId) -> Result<Worm> {
        let index = self
            .worms
            .iter()
            .position(|w| w.id() == id)
            .ok_or_else(|| Error::InvalidState(format!("{} is not a worm in this world", id)))?;
        let mut worm = self.worms.remove(index);

        if let WorldState::InProgress(turn) = &mut self.state {
            if index < turn.index {
                turn.index -= 1;
            } else if index == turn.index {
                turn.current_removed = true;
            }
        }

        worm.body_mut().detach();
        worm.body_mut().terminate()?;
        debug!(event = "worm_removed", world = %self.id, worm = %id);
        Ok(worm)
    }

    pub fn remove_food(&mut self, id: EntityId) -> Result<Food> {
        let mut food = self
            .food
            .remove(&id)
            .ok_or_else(|| Error::InvalidState(format!("{} is not food in this world", id)))?;
        food.body_mut().detach();
        food.body_mut().terminate()?;
        debug!(event = "food_removed", world = %self.id, food = %id);
        Ok(food)
    }

    pub fn remove_projectile(&mut self) -> Result<Projectile> {
        let mut projectile = self
            .projectile
            .take()
            .ok_or_else(|| Error::InvalidState("no projectile in this world".to_string()))?;
        projectile.body_mut().detach();
        projectile.body_mut().terminate()?;
        debug!(event = "projectile_removed", world = %self.id, projectile = %projectile.id());
        Ok(projectile)
    }

    /// Remove a worm that lost all health or left the world
    pub(crate) fn kill_worm(&mut self, id: EntityId, cause: &str) -> Result<()> {
        let worm = self.remove_worm(id)?;
        info!(event = "worm_died", world = %self.id, worm = %id, name = worm.name(), cause);
        Ok(())
    }

    /// Terminate the world and every entity it holds.
    ///
    /// Collections are emptied before any entity is terminated. Returns the
    /// terminated entities; a second call returns nothing.
    pub fn terminate(&mut self) -> Vec<Entity> {
        if self.is_terminated() {
            return Vec::new();
        }

        let worms = std::mem::take(&mut self.worms);
        let food = std::mem::take(&mut self.food);
        let projectile = self.projectile.take();
        self.teams.clear();
        self.state = WorldState::Terminated;

        let mut released: Vec<Entity> = worms.into_iter().map(Entity::Worm).collect();
        released.extend(food.into_values().map(Entity::Food));
        released.extend(projectile.map(Entity::Projectile));

        for entity in &mut released {
            let body = match entity {
                Entity::Worm(worm) => worm.body_mut(),
                Entity::Food(food) => food.body_mut(),
                Entity::Projectile(projectile) => projectile.body_mut(),
            };
            body.detach();
            if let Err(err) = body.terminate() {
                warn!(event = "terminate_failed", world = %self.id, error = %err);
            }
        }

        info!(event = "world_terminated", world = %self.id, entities = released.len());
        released
    }

    // ----- turns -----

    /// Begin the game with the first worm in turn order
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            WorldState::NotStarted => {}
            WorldState::Terminated => {
                return Err(Error::InvalidState("cannot start a terminated world".to_string()))
            }
            _ => return Err(Error::InvalidState("world has already started".to_string())),
        }

        if self.worms.is_empty() {
            self.state = WorldState::Finished;
            info!(event = "game_finished", world = %self.id, winner = "none");
            return Ok(());
        }

        self.state = WorldState::InProgress(Turn {
            index: 0,
            number: 1,
            current_removed: false,
        });
        self.worms[0].replenish();
        info!(event = "game_started", world = %self.id, worms = self.worms.len(), first = self.worms[0].name());
        Ok(())
    }

    /// Hand the turn to the next living worm, or finish the game
    #[instrument(skip(self), fields(world = %self.id))]
    pub fn start_next_turn(&mut self) -> Result<()> {
        let WorldState::InProgress(turn) = self.state else {
            return Err(Error::InvalidState("game is not in progress".to_string()));
        };

        if self.is_game_over() {
            self.state = WorldState::Finished;
            info!(event = "game_finished", world = %self.id, winner = ?self.winner(), turns = turn.number);
            return Ok(());
        }

        let count = self.worms.len();
        let mut index = if turn.current_removed {
            turn.index % count
        } else {
            (turn.index + 1) % count
        };
        for _ in 0..count {
            if self.worms[index].is_alive() {
                break;
            }
            index = (index + 1) % count;
        }

        self.state = WorldState::InProgress(Turn {
            index,
            number: turn.number + 1,
            current_removed: false,
        });
        let worm = &mut self.worms[index];
        worm.replenish();
        info!(
            event = "turn_started",
            turn = turn.number + 1,
            worm = %worm.id(),
            name = worm.name(),
            action_points = worm.action_points(),
            hit_points = worm.hit_points()
        );
        Ok(())
    }

    fn factions(&self) -> BTreeSet<Faction<'_>> {
        self.worms
            .iter()
            .filter(|w| w.is_alive())
            .map(|w| match w.team() {
                Some(team) => Faction::Team(team),
                None => Faction::Solo(w.id()),
            })
            .collect()
    }

    /// At most one team or team-less worm is left
    pub fn is_game_over(&self) -> bool {
        self.factions().len() <= 1
    }

    /// The sole surviving faction, if exactly one is left
    pub fn winner(&self) -> Option<Winner> {
        let factions = self.factions();
        if factions.len() != 1 {
            return None;
        }
        match factions.into_iter().next()? {
            Faction::Team(team) => Some(Winner::Team(team.to_string())),
            Faction::Solo(id) => self.worm(id).map(|w| Winner::Worm(w.name().to_string())),
        }
    }

    // ----- random placement -----

    /// Add a worm at a random spot touching terrain
    pub fn add_new_worm(&mut self, program: Option<ProgramInstance>) -> Result<EntityId> {
        self.ensure_open()?;
        let radius = self.config.worm.spawn_radius;
        let position = self.find_spawn_location(radius)?;
        let direction = self.rng.gen::<f64>() * 2.0 * PI;
        let name = format!("Worm {}", self.worms.len() + 1);

        let mut worm = Worm::new(&name, position, direction, radius, &self.config.worm)?;
        if let Some(program) = program {
            worm.attach_program(program);
        }
        self.add_worm(worm)
    }

    /// Add a food ration at a random spot touching terrain
    pub fn add_new_food(&mut self) -> Result<EntityId> {
        self.ensure_open()?;
        let position = self.find_spawn_location(self.config.food.radius)?;
        let food = Food::new(position, &self.config.food)?;
        self.add_food(food)
    }

    /// Pick random points and walk each towards the centre until the disc
    /// touches terrain.
    fn find_spawn_location(&mut self, radius: f64) -> Result<Position> {
        let centre = Position::new(self.width() / 2.0, self.height() / 2.0);
        let step = radius * self.config.worm.search_step_fraction;

        for _ in 0..self.config.spawn.attempts {
            let start = Position::new(
                self.rng.gen::<f64>() * self.width(),
                self.rng.gen::<f64>() * self.height(),
            );
            let distance = start.distance(&centre);
            let bearing = start.bearing_to(&centre);
            let samples = sample_count(distance, step)?;

            for k in 0..samples {
                let candidate = start.towards(bearing, (k as f64 * step).min(distance));
                if self.grid.is_inside(candidate, radius)
                    && self.grid.classify(candidate, radius)? == Location::Contact
                {
                    return Ok(candidate);
                }
            }
        }

        Err(Error::InvalidState(format!(
            "no place for radius {} after {} attempts",
            radius, self.config.spawn.attempts
        )))
    }
}
