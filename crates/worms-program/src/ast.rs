//! Abstract syntax tree of the worm programming language.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Negate,
    Sqrt,
    Sin,
    Cos,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    /// Ordering comparisons on doubles
    pub fn is_ordering(&self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Numeric properties a program can read from an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    X,
    Y,
    Radius,
    Direction,
    ActionPoints,
    MaxActionPoints,
    HitPoints,
    MaxHitPoints,
}

impl Property {
    /// Whether the property only exists on worms
    pub fn is_worm_only(&self) -> bool {
        matches!(
            self,
            Property::ActionPoints
                | Property::MaxActionPoints
                | Property::HitPoints
                | Property::MaxHitPoints
        )
    }
}

/// Entity kinds a `foreach` loop can range over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityFilter {
    Worm,
    Food,
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expression {
    Literal {
        value: Value,
    },
    /// The worm executing the program
    SelfRef,
    Variable {
        name: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Inspect {
        property: Property,
        target: Box<Expression>,
    },
    SameTeam {
        target: Box<Expression>,
    },
    IsWorm {
        target: Box<Expression>,
    },
    IsFood {
        target: Box<Expression>,
    },
    /// Nearest worm or food along the ray at `self.direction + angle`
    Search {
        angle: Box<Expression>,
    },
}

impl Expression {
    pub fn double(value: f64) -> Self {
        Expression::Literal {
            value: Value::Double(value),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Literal {
            value: Value::Bool(value),
        }
    }

    pub fn null() -> Self {
        Expression::Literal {
            value: Value::Entity(None),
        }
    }

    pub fn var(name: &str) -> Self {
        Expression::Variable {
            name: name.to_string(),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn inspect(property: Property, target: Expression) -> Self {
        Expression::Inspect {
            property,
            target: Box::new(target),
        }
    }

    pub fn search(angle: Expression) -> Self {
        Expression::Search {
            angle: Box::new(angle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Statement {
    // Actions
    Turn {
        angle: Expression,
    },
    Move,
    Jump,
    ToggleWeapon,
    Fire {
        yield_percent: Expression,
    },

    // Free statements
    Skip,
    Assign {
        variable: String,
        value: Expression,
    },
    Print {
        value: Expression,
    },

    // Control flow
    If {
        condition: Expression,
        then: Box<Statement>,
        otherwise: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    ForEach {
        filter: EntityFilter,
        variable: String,
        body: Box<Statement>,
    },
    Sequence {
        statements: Vec<Statement>,
    },
}

impl Statement {
    /// Returns true if this statement spends action points
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            Statement::Turn { .. }
                | Statement::Move
                | Statement::Jump
                | Statement::ToggleWeapon
                | Statement::Fire { .. }
        )
    }

    /// Returns true if this statement has nested statements
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Statement::If { .. }
                | Statement::While { .. }
                | Statement::ForEach { .. }
                | Statement::Sequence { .. }
        )
    }

    /// Directly nested statements, in execution order
    pub fn children(&self) -> Vec<&Statement> {
        match self {
            Statement::If {
                then, otherwise, ..
            } => vec![then.as_ref(), otherwise.as_ref()],
            Statement::While { body, .. } | Statement::ForEach { body, .. } => vec![body.as_ref()],
            Statement::Sequence { statements } => statements.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn contains_action(&self) -> bool {
        self.is_action() || self.children().into_iter().any(Statement::contains_action)
    }

    pub fn sequence(statements: Vec<Statement>) -> Self {
        Statement::Sequence { statements }
    }

    pub fn turn(angle: Expression) -> Self {
        Statement::Turn { angle }
    }

    pub fn fire(yield_percent: Expression) -> Self {
        Statement::Fire { yield_percent }
    }

    pub fn assign(variable: &str, value: Expression) -> Self {
        Statement::Assign {
            variable: variable.to_string(),
            value,
        }
    }

    pub fn print(value: Expression) -> Self {
        Statement::Print { value }
    }

    pub fn if_else(condition: Expression, then: Statement, otherwise: Statement) -> Self {
        Statement::If {
            condition,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn while_loop(condition: Expression, body: Statement) -> Self {
        Statement::While {
            condition,
            body: Box::new(body),
        }
    }

    pub fn for_each(filter: EntityFilter, variable: &str, body: Statement) -> Self {
        Statement::ForEach {
            filter,
            variable: variable.to_string(),
            body: Box::new(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_properties() {
        assert!(BinaryOp::Add.is_arithmetic());
        assert!(!BinaryOp::Lt.is_arithmetic());
        assert!(BinaryOp::Ge.is_ordering());
        assert!(BinaryOp::Ne.is_equality());
        assert!(BinaryOp::Or.is_logical());
        assert!(Property::HitPoints.is_worm_only());
        assert!(!Property::Radius.is_worm_only());
    }

    #[test]
    fn test_statement_classification() {
        assert!(Statement::Move.is_action());
        assert!(Statement::turn(Expression::double(0.5)).is_action());
        assert!(!Statement::Skip.is_action());
        assert!(!Statement::print(Expression::double(1.0)).is_action());
        assert!(Statement::sequence(vec![]).is_control_flow());
    }

    #[test]
    fn test_contains_action() {
        let program = Statement::sequence(vec![
            Statement::Skip,
            Statement::while_loop(
                Expression::boolean(true),
                Statement::sequence(vec![Statement::Move, Statement::Jump]),
            ),
        ]);
        assert!(program.contains_action());
        assert!(!Statement::sequence(vec![Statement::Skip]).contains_action());
    }

    #[test]
    fn test_json_shape() {
        let stmt = Statement::if_else(
            Expression::binary(BinaryOp::Lt, Expression::var("a"), Expression::double(2.0)),
            Statement::Move,
            Statement::Skip,
        );
        let json = serde_json::to_value(&stmt).unwrap();
        assert_eq!(json["stmt"], "if");
        assert_eq!(json["condition"]["expr"], "binary");
        assert_eq!(json["condition"]["op"], "lt");
        assert_eq!(json["then"]["stmt"], "move");
    }
}
