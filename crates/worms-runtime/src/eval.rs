//! Expression evaluation.

use crate::context::ProgramContext;
use worms_core::{EntityId, EntityKind, Error, Position, Result};
use worms_program::{BinaryOp, EntityFilter, Expression, Globals, Property, UnaryOp, Value};

/// What an expression can see while it is evaluated.
///
/// Without a context only literals, variables and operators evaluate;
/// anything touching the world fails with `InvalidState`.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub globals: &'a Globals,
    pub worm: Option<EntityId>,
    pub ctx: Option<&'a dyn ProgramContext>,
}

impl<'a> Scope<'a> {
    pub fn detached(globals: &'a Globals) -> Self {
        Self {
            globals,
            worm: None,
            ctx: None,
        }
    }

    fn context(&self) -> Result<&'a dyn ProgramContext> {
        self.ctx
            .ok_or_else(|| Error::InvalidState("expression needs a world to evaluate".to_string()))
    }

    fn self_worm(&self) -> Result<EntityId> {
        self.worm
            .ok_or_else(|| Error::InvalidState("program is not bound to a worm".to_string()))
    }
}

pub fn evaluate(expr: &Expression, scope: &Scope<'_>) -> Result<Value> {
    match expr {
        Expression::Literal { value } => Ok(*value),
        Expression::SelfRef => Ok(Value::Entity(Some(scope.self_worm()?))),
        Expression::Variable { name } => scope
            .globals
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("unbound variable '{}'", name))),
        Expression::Unary { op, operand } => {
            let value = evaluate(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.as_bool()?)),
                UnaryOp::Negate => Ok(Value::Double(-value.as_f64()?)),
                UnaryOp::Sqrt => Ok(Value::Double(value.as_f64()?.sqrt())),
                UnaryOp::Sin => Ok(Value::Double(value.as_f64()?.sin())),
                UnaryOp::Cos => Ok(Value::Double(value.as_f64()?.cos())),
            }
        }
        Expression::Binary { op, lhs, rhs } => evaluate_binary(*op, lhs, rhs, scope),
        Expression::Inspect { property, target } => {
            let id = non_null(evaluate(target, scope)?, "inspect")?;
            let value = scope.context()?.inspect(id, *property)?;
            Ok(Value::Double(value))
        }
        Expression::SameTeam { target } => {
            let Some(other) = evaluate(target, scope)?.as_entity()? else {
                return Ok(Value::Bool(false));
            };
            let ctx = scope.context()?;
            let mine = ctx.team_of(scope.self_worm()?);
            Ok(Value::Bool(mine.is_some() && mine == ctx.team_of(other)))
        }
        Expression::IsWorm { target } => is_kind(target, EntityKind::Worm, scope),
        Expression::IsFood { target } => is_kind(target, EntityKind::Food, scope),
        Expression::Search { angle } => {
            let offset = evaluate(angle, scope)?.as_f64()?;
            search(offset, scope).map(Value::Entity)
        }
    }
}

fn evaluate_binary(
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
    scope: &Scope<'_>,
) -> Result<Value> {
    let left = evaluate(lhs, scope)?;

    match op {
        // Logical operators short-circuit
        BinaryOp::And => {
            if !left.as_bool()? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(evaluate(rhs, scope)?.as_bool()?))
        }
        BinaryOp::Or => {
            if left.as_bool()? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(evaluate(rhs, scope)?.as_bool()?))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let right = evaluate(rhs, scope)?;
            if left.value_type() != right.value_type() {
                return Err(Error::InvalidArgument(format!(
                    "cannot compare {} with {}",
                    left.value_type(),
                    right.value_type()
                )));
            }
            Ok(Value::Bool((left == right) == (op == BinaryOp::Eq)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let (a, b) = (left.as_f64()?, evaluate(rhs, scope)?.as_f64()?);
            let value = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => a / b,
            };
            Ok(Value::Double(value))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let (a, b) = (left.as_f64()?, evaluate(rhs, scope)?.as_f64()?);
            let holds = match op {
                BinaryOp::Lt => a < b,
                BinaryOp::Le => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            };
            Ok(Value::Bool(holds))
        }
    }
}

fn non_null(value: Value, what: &str) -> Result<EntityId> {
    value
        .as_entity()?
        .ok_or_else(|| Error::InvalidArgument(format!("cannot {} the null entity", what)))
}

fn is_kind(target: &Expression, kind: EntityKind, scope: &Scope<'_>) -> Result<Value> {
    match evaluate(target, scope)?.as_entity()? {
        None => Ok(Value::Bool(false)),
        Some(id) => Ok(Value::Bool(scope.context()?.kind_of(id) == Some(kind))),
    }
}

/// Nearest worm or food whose disc is crossed by the ray leaving the bound
/// worm at its direction plus `offset`.
fn search(offset: f64, scope: &Scope<'_>) -> Result<Option<EntityId>> {
    let ctx = scope.context()?;
    let me = scope.self_worm()?;
    let origin = ctx
        .position_of(me)
        .ok_or_else(|| Error::InvalidState(format!("{} is not in a world", me)))?;
    let angle = ctx.inspect(me, Property::Direction)? + offset;

    let mut nearest: Option<(f64, EntityId)> = None;
    for id in ctx.entities(EntityFilter::Any) {
        if id == me {
            continue;
        }
        let (Some(centre), Some(radius)) = (ctx.position_of(id), ctx.radius_of(id)) else {
            continue;
        };
        if let Some(distance) = ray_hit_distance(origin, angle, centre, radius) {
            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, id));
            }
        }
    }
    Ok(nearest.map(|(_, id)| id))
}

/// Distance along the ray to the first point inside the disc, if the ray
/// enters it at all. Grazing the rim does not count.
pub fn ray_hit_distance(origin: Position, angle: f64, centre: Position, radius: f64) -> Option<f64> {
    let (dx, dy) = (angle.cos(), angle.sin());
    let (wx, wy) = (centre.x - origin.x, centre.y - origin.y);
    let along = wx * dx + wy * dy;
    let perpendicular_sq = (wx * wx + wy * wy) - along * along;
    let radius_sq = radius * radius;
    if perpendicular_sq >= radius_sq {
        return None;
    }
    let half_chord = (radius_sq - perpendicular_sq).sqrt();
    if along + half_chord < 0.0 {
        return None;
    }
    Some((along - half_chord).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::f64::consts::PI;

    struct Board {
        worms: Vec<(EntityId, Position, f64, Option<String>)>,
        food: Vec<(EntityId, Position, f64)>,
    }

    impl ProgramContext for Board {
        fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
            if self.worms.iter().any(|w| w.0 == id) {
                Some(EntityKind::Worm)
            } else if self.food.iter().any(|f| f.0 == id) {
                Some(EntityKind::Food)
            } else {
                None
            }
        }

        fn position_of(&self, id: EntityId) -> Option<Position> {
            self.worms
                .iter()
                .find(|w| w.0 == id)
                .map(|w| w.1)
                .or_else(|| self.food.iter().find(|f| f.0 == id).map(|f| f.1))
        }

        fn radius_of(&self, id: EntityId) -> Option<f64> {
            self.worms
                .iter()
                .find(|w| w.0 == id)
                .map(|w| w.2)
                .or_else(|| self.food.iter().find(|f| f.0 == id).map(|f| f.2))
        }

        fn inspect(&self, id: EntityId, property: Property) -> Result<f64> {
            let pos = self
                .position_of(id)
                .ok_or_else(|| Error::InvalidArgument("gone".to_string()))?;
            match property {
                Property::X => Ok(pos.x),
                Property::Y => Ok(pos.y),
                Property::Direction => Ok(0.0),
                _ => Ok(1.0),
            }
        }

        fn team_of(&self, id: EntityId) -> Option<String> {
            self.worms.iter().find(|w| w.0 == id).and_then(|w| w.3.clone())
        }

        fn entities(&self, _filter: EntityFilter) -> Vec<EntityId> {
            let mut ids: Vec<_> = self.worms.iter().map(|w| w.0).collect();
            ids.extend(self.food.iter().map(|f| f.0));
            ids
        }

        fn action_points(&self, _worm: EntityId) -> Result<u32> {
            Ok(0)
        }

        fn action_cost(&self, _worm: EntityId, _action: &crate::WormAction) -> Result<u32> {
            Ok(0)
        }

        fn perform(&mut self, _worm: EntityId, _action: crate::WormAction) -> Result<()> {
            Ok(())
        }
    }

    fn board() -> Board {
        Board {
            worms: vec![
                (EntityId(1), Position::new(0.0, 0.0), 0.5, Some("Red".to_string())),
                (EntityId(2), Position::new(5.0, 0.0), 0.5, Some("Red".to_string())),
                (EntityId(3), Position::new(9.0, 0.2), 0.5, Some("Blue".to_string())),
                (EntityId(4), Position::new(0.0, 4.0), 0.5, None),
            ],
            food: vec![(EntityId(5), Position::new(3.0, 0.1), 0.2)],
        }
    }

    fn eval_with(expr: &Expression, board: &Board) -> Result<Value> {
        let globals = HashMap::new();
        let scope = Scope {
            globals: &globals,
            worm: Some(EntityId(1)),
            ctx: Some(board),
        };
        evaluate(expr, &scope)
    }

    #[test]
    fn test_literal_arithmetic_without_world() {
        let mut globals = Globals::new();
        globals.insert("a".to_string(), Value::Double(4.0));
        let scope = Scope::detached(&globals);

        let expr = Expression::binary(
            BinaryOp::Mul,
            Expression::unary(UnaryOp::Sqrt, Expression::var("a")),
            Expression::double(1.5),
        );
        assert_eq!(evaluate(&expr, &scope).unwrap(), Value::Double(3.0));

        let cmp = Expression::binary(BinaryOp::Ne, Expression::null(), Expression::null());
        assert_eq!(evaluate(&cmp, &scope).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_short_circuit() {
        let globals = Globals::new();
        let scope = Scope::detached(&globals);
        // the right operand would fail: unbound variable
        let expr = Expression::binary(
            BinaryOp::Or,
            Expression::boolean(true),
            Expression::var("missing"),
        );
        assert_eq!(evaluate(&expr, &scope).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_runtime_errors() {
        let globals = Globals::new();
        let scope = Scope::detached(&globals);
        assert!(evaluate(&Expression::var("x"), &scope)
            .unwrap_err()
            .is_invalid_argument());
        let bad = Expression::unary(UnaryOp::Not, Expression::double(1.0));
        assert!(evaluate(&bad, &scope).unwrap_err().is_invalid_argument());
        assert!(evaluate(&Expression::SelfRef, &scope)
            .unwrap_err()
            .is_invalid_state());

        let board = board();
        let inspect_null = Expression::inspect(Property::X, Expression::null());
        assert!(eval_with(&inspect_null, &board).is_err());
    }

    #[test]
    fn test_entity_queries() {
        let board = board();
        let worm2 = Expression::Literal {
            value: Value::Entity(Some(EntityId(2))),
        };
        let food = Expression::Literal {
            value: Value::Entity(Some(EntityId(5))),
        };
        let loner = Expression::Literal {
            value: Value::Entity(Some(EntityId(4))),
        };

        let same = |e: &Expression| Expression::SameTeam {
            target: Box::new(e.clone()),
        };
        assert_eq!(eval_with(&same(&worm2), &board).unwrap(), Value::Bool(true));
        assert_eq!(eval_with(&same(&loner), &board).unwrap(), Value::Bool(false));
        assert_eq!(
            eval_with(&same(&Expression::null()), &board).unwrap(),
            Value::Bool(false)
        );

        let is_food = Expression::IsFood {
            target: Box::new(food.clone()),
        };
        assert_eq!(eval_with(&is_food, &board).unwrap(), Value::Bool(true));
        let is_worm = Expression::IsWorm {
            target: Box::new(food),
        };
        assert_eq!(eval_with(&is_worm, &board).unwrap(), Value::Bool(false));

        let x = Expression::inspect(Property::X, worm2);
        assert_eq!(eval_with(&x, &board).unwrap(), Value::Double(5.0));
    }

    #[test]
    fn test_search_finds_nearest_along_ray() {
        let board = board();
        // straight ahead: food at x=3 is closer than the worm at x=5
        let ahead = eval_with(&Expression::search(Expression::double(0.0)), &board).unwrap();
        assert_eq!(ahead, Value::Entity(Some(EntityId(5))));

        // straight up hits the team-less worm
        let up = eval_with(&Expression::search(Expression::double(PI / 2.0)), &board).unwrap();
        assert_eq!(up, Value::Entity(Some(EntityId(4))));

        // nothing behind
        let behind = eval_with(&Expression::search(Expression::double(PI)), &board).unwrap();
        assert_eq!(behind, Value::Entity(None));
    }

    #[test]
    fn test_ray_hit_distance() {
        let origin = Position::new(0.0, 0.0);
        let hit = ray_hit_distance(origin, 0.0, Position::new(4.0, 0.0), 1.0).unwrap();
        assert!((hit - 3.0).abs() < 1e-12);
        // tangent ray
        assert!(ray_hit_distance(origin, 0.0, Position::new(4.0, 1.0), 1.0).is_none());
        // disc behind the origin
        assert!(ray_hit_distance(origin, 0.0, Position::new(-4.0, 0.0), 1.0).is_none());
    }
}
