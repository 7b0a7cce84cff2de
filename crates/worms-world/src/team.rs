//! Teams group worms that win together.

use serde::{Deserialize, Serialize};
use worms_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    name: String,
}

impl Team {
    pub fn new(name: &str) -> Result<Self> {
        if !is_valid_team_name(name) {
            return Err(Error::InvalidArgument(format!(
                "illegal team name '{}'",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// At least two letters, nothing but letters, starting with a capital
pub fn is_valid_team_name(name: &str) -> bool {
    name.chars().count() >= 2
        && name.chars().all(char::is_alphabetic)
        && name.chars().next().map_or(false, char::is_uppercase)
}
