//! Typed values manipulated by worm programs.

use serde::{Deserialize, Serialize};
use std::fmt;
use worms_core::{EntityId, Error, Result};

/// The three disjoint value kinds of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Double,
    Bool,
    Entity,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Double => "double",
            ValueType::Bool => "bool",
            ValueType::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// A value produced by evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Double(f64),
    Bool(bool),
    /// `None` is the null reference
    Entity(Option<EntityId>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Double(_) => ValueType::Double,
            Value::Bool(_) => ValueType::Bool,
            Value::Entity(_) => ValueType::Entity,
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Double(v) => Ok(*v),
            other => Err(kind_mismatch(ValueType::Double, other)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(kind_mismatch(ValueType::Bool, other)),
        }
    }

    pub fn as_entity(&self) -> Result<Option<EntityId>> {
        match self {
            Value::Entity(v) => Ok(*v),
            other => Err(kind_mismatch(ValueType::Entity, other)),
        }
    }
}

fn kind_mismatch(expected: ValueType, found: &Value) -> Error {
    Error::InvalidArgument(format!(
        "expected a {} operand, found {}",
        expected,
        found.value_type()
    ))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Double(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Entity(Some(id)) => write!(f, "{}", id),
            Value::Entity(None) => f.write_str("null"),
        }
    }
}
