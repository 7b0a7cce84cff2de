//! Game world for worm battles.
//!
//! The world owns every worm, food ration and projectile, keeps the turn
//! order and carries out worm commands against the terrain grid.

pub mod actions;
pub mod context;
pub mod entity;
pub mod food;
pub mod grid;
pub mod projectile;
pub mod team;
pub mod world;
pub mod worm;

pub use actions::Impact;
pub use entity::{Body, Entity, Massive, Membership, Placed};
pub use food::Food;
pub use grid::{Location, TerrainGrid};
pub use projectile::{Projectile, WeaponKind, MAX_YIELD};
pub use team::{is_valid_team_name, Team};
pub use world::{Turn, Winner, World, WorldState};
pub use worm::{is_valid_worm_name, Worm};
