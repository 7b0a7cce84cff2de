//! Core types and utilities for the Worms arena engine.

pub mod types;
pub mod config;
pub mod error;
pub mod physics;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use physics::{Ballistic, GRAVITY};
