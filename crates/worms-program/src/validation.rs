//! Well-formedness checking for worm programs.

use crate::ast::{BinaryOp, Expression, Statement, UnaryOp};
use crate::program::{Globals, Program};
use crate::value::ValueType;
use worms_core::{Error, Result};

/// Validate that a program is well-formed.
///
/// A well-formed program is type-correct against its declared globals and
/// has no action statement inside a `foreach` body.
pub fn validate_program(program: &Program) -> Result<()> {
    check_statement(&program.root, &program.globals)
}

pub fn is_well_formed(program: &Program) -> bool {
    validate_program(program).is_ok()
}

fn malformed(message: String) -> Error {
    Error::InvalidArgument(format!("program is not well-formed: {}", message))
}

fn expect_type(expr: &Expression, globals: &Globals, expected: ValueType, role: &str) -> Result<()> {
    let found = type_of(expr, globals)?;
    if found != expected {
        return Err(malformed(format!(
            "{} must be {}, found {}",
            role, expected, found
        )));
    }
    Ok(())
}

fn check_statement(stmt: &Statement, globals: &Globals) -> Result<()> {
    match stmt {
        Statement::Turn { angle } => expect_type(angle, globals, ValueType::Double, "turn angle"),
        Statement::Fire { yield_percent } => {
            expect_type(yield_percent, globals, ValueType::Double, "fire yield")
        }
        Statement::Move | Statement::Jump | Statement::ToggleWeapon | Statement::Skip => Ok(()),
        Statement::Assign { variable, value } => {
            let declared = globals.get(variable).map(|v| v.value_type()).ok_or_else(|| {
                malformed(format!("assignment to undeclared variable '{}'", variable))
            })?;
            expect_type(value, globals, declared, &format!("value assigned to '{}'", variable))
        }
        Statement::Print { value } => type_of(value, globals).map(|_| ()),
        Statement::If {
            condition,
            then,
            otherwise,
        } => {
            expect_type(condition, globals, ValueType::Bool, "if condition")?;
            check_statement(then, globals)?;
            check_statement(otherwise, globals)
        }
        Statement::While { condition, body } => {
            expect_type(condition, globals, ValueType::Bool, "while condition")?;
            check_statement(body, globals)
        }
        Statement::ForEach { variable, body, .. } => {
            match globals.get(variable).map(|v| v.value_type()) {
                Some(ValueType::Entity) => {}
                Some(other) => {
                    return Err(malformed(format!(
                        "foreach variable '{}' is declared {}",
                        variable, other
                    )))
                }
                None => {
                    return Err(malformed(format!(
                        "foreach variable '{}' is not declared",
                        variable
                    )))
                }
            }
            if body.contains_action() {
                return Err(malformed("action statement inside a foreach body".to_string()));
            }
            check_statement(body, globals)
        }
        Statement::Sequence { statements } => statements
            .iter()
            .try_for_each(|s| check_statement(s, globals)),
    }
}

/// Static type of an expression against the declared globals
pub fn type_of(expr: &Expression, globals: &Globals) -> Result<ValueType> {
    match expr {
        Expression::Literal { value } => Ok(value.value_type()),
        Expression::SelfRef => Ok(ValueType::Entity),
        Expression::Variable { name } => globals
            .get(name)
            .map(|v| v.value_type())
            .ok_or_else(|| malformed(format!("unbound variable '{}'", name))),
        Expression::Unary { op, operand } => {
            let expected = match op {
                UnaryOp::Not => ValueType::Bool,
                UnaryOp::Negate | UnaryOp::Sqrt | UnaryOp::Sin | UnaryOp::Cos => ValueType::Double,
            };
            expect_type(operand, globals, expected, &format!("operand of {:?}", op))?;
            Ok(expected)
        }
        Expression::Binary { op, lhs, rhs } => type_of_binary(*op, lhs, rhs, globals),
        Expression::Inspect { target, .. } => {
            expect_type(target, globals, ValueType::Entity, "inspected target")?;
            Ok(ValueType::Double)
        }
        Expression::SameTeam { target }
        | Expression::IsWorm { target }
        | Expression::IsFood { target } => {
            expect_type(target, globals, ValueType::Entity, "entity test target")?;
            Ok(ValueType::Bool)
        }
        Expression::Search { angle } => {
            expect_type(angle, globals, ValueType::Double, "search angle")?;
            Ok(ValueType::Entity)
        }
    }
}

fn type_of_binary(
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
    globals: &Globals,
) -> Result<ValueType> {
    let left = type_of(lhs, globals)?;
    let right = type_of(rhs, globals)?;

    let operand = if op.is_arithmetic() || op.is_ordering() {
        ValueType::Double
    } else if op.is_logical() {
        ValueType::Bool
    } else {
        // Equality accepts any kind, as long as both sides agree
        left
    };

    if left != operand || right != operand {
        return Err(malformed(format!(
            "operands of {:?} must both be {}, found {} and {}",
            op, operand, left, right
        )));
    }

    if op.is_arithmetic() {
        Ok(ValueType::Double)
    } else {
        Ok(ValueType::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EntityFilter, Property};
    use crate::value::Value;

    fn base(root: Statement) -> Program {
        Program::new(root)
            .declare("a", Value::Double(1.0))
            .declare("flag", Value::Bool(false))
            .declare("target", Value::Entity(None))
    }

    #[test]
    fn test_validate_valid_program() {
        let program = base(Statement::sequence(vec![
            Statement::assign(
                "target",
                Expression::search(Expression::double(0.0)),
            ),
            Statement::if_else(
                Expression::IsWorm {
                    target: Box::new(Expression::var("target")),
                },
                Statement::fire(Expression::double(50.0)),
                Statement::turn(Expression::inspect(Property::Direction, Expression::SelfRef)),
            ),
            Statement::for_each(
                EntityFilter::Any,
                "target",
                Statement::print(Expression::inspect(Property::X, Expression::var("target"))),
            ),
        ]));
        assert!(validate_program(&program).is_ok());
        assert!(is_well_formed(&program));
    }

    #[test]
    fn test_action_inside_foreach_is_rejected() {
        let program = base(Statement::for_each(
            EntityFilter::Worm,
            "target",
            Statement::sequence(vec![Statement::Skip, Statement::Move]),
        ));
        assert!(!is_well_formed(&program));
    }

    #[test]
    fn test_action_nested_deep_inside_foreach_is_rejected() {
        let program = base(Statement::for_each(
            EntityFilter::Food,
            "target",
            Statement::if_else(
                Expression::boolean(true),
                Statement::Skip,
                Statement::while_loop(Expression::boolean(false), Statement::Jump),
            ),
        ));
        assert!(!is_well_formed(&program));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        // a double assigned to a boolean variable
        let program = base(Statement::assign("flag", Expression::double(2.0)));
        assert!(validate_program(&program).unwrap_err().is_invalid_argument());

        // non-boolean condition
        let program = base(Statement::while_loop(Expression::var("a"), Statement::Skip));
        assert!(!is_well_formed(&program));

        // comparing a double with a boolean
        let program = base(Statement::print(Expression::binary(
            BinaryOp::Eq,
            Expression::var("a"),
            Expression::var("flag"),
        )));
        assert!(!is_well_formed(&program));
    }

    #[test]
    fn test_undeclared_variables_are_rejected() {
        let program = base(Statement::assign("b", Expression::double(2.0)));
        assert!(!is_well_formed(&program));

        let program = base(Statement::print(Expression::var("missing")));
        assert!(!is_well_formed(&program));

        let program = base(Statement::for_each(EntityFilter::Any, "a", Statement::Skip));
        assert!(!is_well_formed(&program));
    }

    #[test]
    fn test_type_of_expressions() {
        let globals = base(Statement::Skip).globals;
        let sum = Expression::binary(BinaryOp::Add, Expression::var("a"), Expression::double(1.0));
        assert_eq!(type_of(&sum, &globals).unwrap(), ValueType::Double);

        let cmp = Expression::binary(BinaryOp::Le, sum, Expression::double(3.0));
        assert_eq!(type_of(&cmp, &globals).unwrap(), ValueType::Bool);

        let same = Expression::binary(BinaryOp::Eq, Expression::SelfRef, Expression::null());
        assert_eq!(type_of(&same, &globals).unwrap(), ValueType::Bool);

        let bad = Expression::unary(UnaryOp::Sqrt, Expression::boolean(true));
        assert!(type_of(&bad, &globals).is_err());
    }
}
