//! Program model for worm behaviour.
//!
//! A program is a statement tree over three value kinds (doubles, booleans
//! and entity references) together with a table of typed global variables.
//! Programs arrive already parsed; this crate only describes and checks them.

pub mod value;
pub mod ast;
pub mod program;
pub mod validation;

pub use value::{Value, ValueType};
pub use ast::{BinaryOp, EntityFilter, Expression, Property, Statement, UnaryOp};
pub use program::{Globals, Program};
pub use validation::{is_well_formed, type_of, validate_program};
