//! Food rations: eating one makes a worm grow.

use crate::entity::{Body, Placed};
use worms_core::{EntityKind, FoodConfig, Position, Result};

#[derive(Debug, Clone)]
pub struct Food {
    body: Body,
}

impl Food {
    pub fn new(position: Position, config: &FoodConfig) -> Result<Self> {
        Ok(Self {
            body: Body::new(position, config.radius, f64::MIN_POSITIVE)?,
        })
    }

    pub(crate) fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Placed for Food {
    fn body(&self) -> &Body {
        &self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Food
    }
}
