//! Program structure: a statement tree plus its global variables.

use crate::ast::Statement;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Global variable table: name to current value
pub type Globals = HashMap<String, Value>;

/// A parsed worm program, as delivered by the parser.
///
/// The initial value of each global also fixes its declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub root: Statement,
    #[serde(default)]
    pub globals: Globals,
}

impl Program {
    pub fn new(root: Statement) -> Self {
        Self {
            root,
            globals: Globals::new(),
        }
    }

    /// Declare a global with its initial value
    pub fn declare(mut self, name: &str, initial: Value) -> Self {
        self.globals.insert(name.to_string(), initial);
        self
    }

    pub fn declared_type(&self, name: &str) -> Option<ValueType> {
        self.globals.get(name).map(Value::value_type)
    }

    pub fn to_json(&self) -> Result<String, worms_core::Error> {
        serde_json::to_string_pretty(self).map_err(worms_core::Error::from)
    }

    pub fn from_json(text: &str) -> Result<Self, worms_core::Error> {
        serde_json::from_str(text).map_err(worms_core::Error::from)
    }
}
