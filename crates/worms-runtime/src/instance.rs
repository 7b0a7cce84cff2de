//! Program instance management and the resumable statement executor.

use crate::context::{ProgramContext, WormAction};
use crate::eval::{evaluate, Scope};
use crate::handler::ActionHandler;
use crate::RuntimeConfig;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use worms_core::{EntityId, EntityKind, Error, Result};
use worms_program::{validate_program, EntityFilter, Expression, Globals, Program, Statement, Value};

/// Execution state of a program instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Next run starts at the root
    Ready,
    /// Next run resumes at the saved cursor
    Suspended,
    /// A runtime error occurred; the instance never runs again
    Faulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendReason {
    ActionPoints { needed: u32, available: u32 },
    StatementBudget,
}

/// How a single run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Suspended(SuspendReason),
    WormDied,
}

/// One marker per compound statement on the path to the current statement
#[derive(Debug, Clone, PartialEq)]
enum Frame {
    Sequence { next: usize },
    If { then_branch: bool },
    While { in_body: bool },
    ForEach {
        items: Vec<EntityId>,
        next: usize,
        in_body: bool,
    },
}

enum Flow {
    Done,
    Suspend(SuspendReason),
    WormDied,
}

struct Run<'c> {
    ctx: &'c mut dyn ProgramContext,
    worm: EntityId,
    budget: u32,
}

impl Run<'_> {
    fn consume(&mut self) -> bool {
        if self.budget == 0 {
            return false;
        }
        self.budget -= 1;
        true
    }
}

fn cursor_mismatch() -> Error {
    Error::InvalidState("execution cursor does not match the program".to_string())
}

/// A program bound to (at most) one worm, with its own globals and cursor
#[derive(Clone)]
pub struct ProgramInstance {
    program: Arc<Program>,
    globals: Globals,
    worm: Option<EntityId>,
    handler: Arc<dyn ActionHandler>,
    config: RuntimeConfig,
    frames: Vec<Frame>,
    state: ExecutionState,
    well_formed: bool,
}

impl ProgramInstance {
    pub fn new(program: Arc<Program>, handler: Arc<dyn ActionHandler>, config: RuntimeConfig) -> Self {
        let well_formed = match validate_program(&program) {
            Ok(()) => true,
            Err(err) => {
                warn!(event = "program_rejected", error = %err);
                false
            }
        };

        Self {
            globals: program.globals.clone(),
            program,
            worm: None,
            handler,
            config,
            frames: Vec::new(),
            state: ExecutionState::Ready,
            well_formed,
        }
    }

    /// An unbound copy with the program's initial globals and no cursor
    pub fn fresh_copy(&self) -> Self {
        Self {
            program: Arc::clone(&self.program),
            globals: self.program.globals.clone(),
            worm: None,
            handler: Arc::clone(&self.handler),
            config: self.config.clone(),
            frames: Vec::new(),
            state: ExecutionState::Ready,
            well_formed: self.well_formed,
        }
    }

    pub fn bind(&mut self, worm: EntityId) {
        self.worm = Some(worm);
    }

    pub fn worm(&self) -> Option<EntityId> {
        self.worm
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    pub fn handler(&self) -> &Arc<dyn ActionHandler> {
        &self.handler
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn is_well_formed(&self) -> bool {
        self.well_formed
    }

    /// Run the program for the bound worm until it completes, suspends or
    /// the worm dies.
    #[instrument(skip(self, ctx), fields(worm = ?self.worm, state = ?self.state))]
    pub fn run(&mut self, ctx: &mut dyn ProgramContext) -> Result<RunOutcome> {
        if !self.well_formed {
            return Err(Error::InvalidState(
                "program is not well-formed and cannot run".to_string(),
            ));
        }
        if self.state == ExecutionState::Faulted {
            return Err(Error::InvalidState("program has faulted".to_string()));
        }
        let worm = self
            .worm
            .ok_or_else(|| Error::InvalidState("program is not bound to a worm".to_string()))?;
        if ctx.kind_of(worm) != Some(EntityKind::Worm) {
            return Err(Error::InvalidState(format!(
                "{} is not a worm in this world",
                worm
            )));
        }

        let program = Arc::clone(&self.program);
        let mut run = Run {
            ctx,
            worm,
            budget: self.config.max_statements_per_run,
        };

        match self.exec(&program.root, 0, &mut run) {
            Ok(Flow::Done) => {
                self.frames.clear();
                self.state = ExecutionState::Ready;
                debug!(event = "program_completed", worm = %worm);
                Ok(RunOutcome::Completed)
            }
            Ok(Flow::Suspend(reason)) => {
                self.state = ExecutionState::Suspended;
                debug!(event = "program_suspended", worm = %worm, reason = ?reason, depth = self.frames.len());
                Ok(RunOutcome::Suspended(reason))
            }
            Ok(Flow::WormDied) => {
                self.frames.clear();
                self.state = ExecutionState::Ready;
                info!(event = "program_worm_died", worm = %worm);
                Ok(RunOutcome::WormDied)
            }
            Err(err) => {
                self.frames.clear();
                self.state = ExecutionState::Faulted;
                warn!(event = "program_faulted", worm = %worm, error = %err);
                Err(err)
            }
        }
    }

    fn eval(&self, expr: &Expression, run: &Run<'_>) -> Result<Value> {
        let scope = Scope {
            globals: &self.globals,
            worm: Some(run.worm),
            ctx: Some(&*run.ctx),
        };
        evaluate(expr, &scope)
    }

    fn exec(&mut self, stmt: &Statement, depth: usize, run: &mut Run<'_>) -> Result<Flow> {
        match stmt {
            Statement::Sequence { statements } => self.exec_sequence(statements, depth, run),
            Statement::If {
                condition,
                then,
                otherwise,
            } => self.exec_if(condition, then, otherwise, depth, run),
            Statement::While { condition, body } => self.exec_while(condition, body, depth, run),
            Statement::ForEach {
                filter,
                variable,
                body,
            } => self.exec_for_each(*filter, variable, body, depth, run),
            leaf => self.exec_leaf(leaf, run),
        }
    }

    fn exec_sequence(
        &mut self,
        statements: &[Statement],
        depth: usize,
        run: &mut Run<'_>,
    ) -> Result<Flow> {
        let mut next = match self.frames.get(depth) {
            Some(Frame::Sequence { next }) => *next,
            Some(_) => return Err(cursor_mismatch()),
            None => {
                self.frames.push(Frame::Sequence { next: 0 });
                0
            }
        };

        while let Some(child) = statements.get(next) {
            match self.exec(child, depth + 1, run)? {
                Flow::Done => {}
                stop => return Ok(stop),
            }
            next += 1;
            self.frames[depth] = Frame::Sequence { next };
        }

        self.frames.truncate(depth);
        Ok(Flow::Done)
    }

    fn exec_if(
        &mut self,
        condition: &Expression,
        then: &Statement,
        otherwise: &Statement,
        depth: usize,
        run: &mut Run<'_>,
    ) -> Result<Flow> {
        let then_branch = match self.frames.get(depth) {
            Some(Frame::If { then_branch }) => *then_branch,
            Some(_) => return Err(cursor_mismatch()),
            None => {
                if !run.consume() {
                    return Ok(Flow::Suspend(SuspendReason::StatementBudget));
                }
                let chosen = self.eval(condition, run)?.as_bool()?;
                self.frames.push(Frame::If {
                    then_branch: chosen,
                });
                chosen
            }
        };

        let branch = if then_branch { then } else { otherwise };
        let flow = self.exec(branch, depth + 1, run)?;
        if let Flow::Done = flow {
            self.frames.truncate(depth);
        }
        Ok(flow)
    }

    fn exec_while(
        &mut self,
        condition: &Expression,
        body: &Statement,
        depth: usize,
        run: &mut Run<'_>,
    ) -> Result<Flow> {
        let mut in_body = match self.frames.get(depth) {
            Some(Frame::While { in_body }) => *in_body,
            Some(_) => return Err(cursor_mismatch()),
            None => {
                self.frames.push(Frame::While { in_body: false });
                false
            }
        };

        loop {
            if !in_body {
                if !run.consume() {
                    return Ok(Flow::Suspend(SuspendReason::StatementBudget));
                }
                if !self.eval(condition, run)?.as_bool()? {
                    self.frames.truncate(depth);
                    return Ok(Flow::Done);
                }
                in_body = true;
                self.frames[depth] = Frame::While { in_body };
            }

            match self.exec(body, depth + 1, run)? {
                Flow::Done => {}
                stop => return Ok(stop),
            }
            in_body = false;
            self.frames[depth] = Frame::While { in_body };
        }
    }

    fn exec_for_each(
        &mut self,
        filter: EntityFilter,
        variable: &str,
        body: &Statement,
        depth: usize,
        run: &mut Run<'_>,
    ) -> Result<Flow> {
        if self.frames.len() <= depth {
            let items = run.ctx.entities(filter);
            self.frames.push(Frame::ForEach {
                items,
                next: 0,
                in_body: false,
            });
        }

        loop {
            let (item, in_body) = match self.frames.get(depth) {
                Some(Frame::ForEach {
                    items,
                    next,
                    in_body,
                }) => (items.get(*next).copied(), *in_body),
                _ => return Err(cursor_mismatch()),
            };
            let Some(item) = item else {
                self.frames.truncate(depth);
                return Ok(Flow::Done);
            };

            if run.ctx.kind_of(item).is_none() {
                // Left the world after the snapshot was taken
                self.frames.truncate(depth + 1);
                self.advance_for_each(depth);
                continue;
            }

            if !in_body {
                if !run.consume() {
                    return Ok(Flow::Suspend(SuspendReason::StatementBudget));
                }
                self.globals
                    .insert(variable.to_string(), Value::Entity(Some(item)));
                if let Some(Frame::ForEach { in_body, .. }) = self.frames.get_mut(depth) {
                    *in_body = true;
                }
            }

            match self.exec(body, depth + 1, run)? {
                Flow::Done => {}
                stop => return Ok(stop),
            }
            self.advance_for_each(depth);
        }
    }

    fn advance_for_each(&mut self, depth: usize) {
        if let Some(Frame::ForEach { next, in_body, .. }) = self.frames.get_mut(depth) {
            *next += 1;
            *in_body = false;
        }
    }

    /// Actions are charged against the budget in `perform`, once the worm
    /// can pay for them.
    fn exec_leaf(&mut self, stmt: &Statement, run: &mut Run<'_>) -> Result<Flow> {
        if !stmt.is_action() && !run.consume() {
            return Ok(Flow::Suspend(SuspendReason::StatementBudget));
        }

        let action = match stmt {
            Statement::Skip => return Ok(Flow::Done),
            Statement::Assign { variable, value } => {
                let value = self.eval(value, run)?;
                self.assign(variable, value)?;
                return Ok(Flow::Done);
            }
            Statement::Print { value } => {
                let value = self.eval(value, run)?;
                self.handler.print(&value.to_string());
                return Ok(Flow::Done);
            }
            Statement::Turn { angle } => WormAction::Turn {
                angle: self.eval(angle, run)?.as_f64()?,
            },
            Statement::Move => WormAction::Move,
            Statement::Jump => WormAction::Jump,
            Statement::ToggleWeapon => WormAction::ToggleWeapon,
            Statement::Fire { yield_percent } => {
                let raw = self.eval(yield_percent, run)?.as_f64()?;
                if !raw.is_finite() || raw < 0.0 || raw > f64::from(u32::MAX) {
                    if !run.consume() {
                        return Ok(Flow::Suspend(SuspendReason::StatementBudget));
                    }
                    debug!(event = "program_action_skipped", worm = %run.worm, action = "fire", reason = "yield out of range", yield_value = raw);
                    return Ok(Flow::Done);
                }
                WormAction::Fire {
                    yield_percent: raw.round() as u32,
                }
            }
            Statement::Sequence { .. }
            | Statement::If { .. }
            | Statement::While { .. }
            | Statement::ForEach { .. } => return Err(cursor_mismatch()),
        };

        self.perform(action, run)
    }

    fn assign(&mut self, variable: &str, value: Value) -> Result<()> {
        let slot = self
            .globals
            .get_mut(variable)
            .ok_or_else(|| Error::InvalidArgument(format!("unbound variable '{}'", variable)))?;
        if slot.value_type() != value.value_type() {
            return Err(Error::InvalidArgument(format!(
                "cannot assign a {} to '{}' of type {}",
                value.value_type(),
                variable,
                slot.value_type()
            )));
        }
        *slot = value;
        Ok(())
    }

    fn perform(&mut self, action: WormAction, run: &mut Run<'_>) -> Result<Flow> {
        let worm = run.worm;
        let cost = match run.ctx.action_cost(worm, &action) {
            Ok(cost) => cost,
            Err(err) => {
                if !run.consume() {
                    return Ok(Flow::Suspend(SuspendReason::StatementBudget));
                }
                debug!(event = "program_action_skipped", worm = %worm, action = action.name(), reason = %err);
                return Ok(Flow::Done);
            }
        };

        let available = run.ctx.action_points(worm)?;
        if available < cost {
            return Ok(Flow::Suspend(SuspendReason::ActionPoints {
                needed: cost,
                available,
            }));
        }
        if !run.consume() {
            return Ok(Flow::Suspend(SuspendReason::StatementBudget));
        }

        if let Err(err) = run.ctx.perform(worm, action) {
            debug!(event = "program_action_skipped", worm = %worm, action = action.name(), reason = %err);
            return Ok(Flow::Done);
        }
        self.notify(worm, action);

        if run.ctx.kind_of(worm) != Some(EntityKind::Worm) {
            return Ok(Flow::WormDied);
        }
        Ok(Flow::Done)
    }

    fn notify(&self, worm: EntityId, action: WormAction) {
        match action {
            WormAction::Turn { angle } => self.handler.turned(worm, angle),
            WormAction::Move => self.handler.moved(worm),
            WormAction::Jump => self.handler.jumped(worm),
            WormAction::Fire { yield_percent } => self.handler.fired(worm, yield_percent),
            WormAction::ToggleWeapon => self.handler.toggled_weapon(worm),
        }
    }
}

impl fmt::Debug for ProgramInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramInstance")
            .field("worm", &self.worm)
            .field("state", &self.state)
            .field("well_formed", &self.well_formed)
            .field("globals", &self.globals)
            .field("depth", &self.frames.len())
            .finish_non_exhaustive()
    }
}
