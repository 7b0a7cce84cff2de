//! Runtime for executing worm programs.
//!
//! This module provides the execution environment for programs, including:
//! - The context seam through which programs observe and act on the world
//! - Action handlers notified of every effect
//! - A resumable executor bounded by action points and a statement budget

pub mod context;
pub mod eval;
pub mod handler;
pub mod instance;

pub use context::{ProgramContext, WormAction};
pub use eval::{evaluate, Scope};
pub use handler::{ActionHandler, HandlerEvent, RecordingHandler, TracingHandler};
pub use instance::{ExecutionState, ProgramInstance, RunOutcome, SuspendReason};

use std::sync::Arc;
use worms_core::ProgramConfig;
use worms_program::Program;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Maximum statements executed per run
    pub max_statements_per_run: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from(&ProgramConfig::default())
    }
}

impl From<&ProgramConfig> for RuntimeConfig {
    fn from(config: &ProgramConfig) -> Self {
        Self {
            max_statements_per_run: config.max_statements_per_run,
        }
    }
}

/// Creates program instances that share one action handler
pub struct Runtime {
    config: RuntimeConfig,
    handler: Arc<dyn ActionHandler>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig, handler: Arc<dyn ActionHandler>) -> Self {
        Self { config, handler }
    }

    /// Runtime whose programs report through `tracing`
    pub fn with_tracing(config: RuntimeConfig) -> Self {
        Self::new(config, Arc::new(TracingHandler))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn handler(&self) -> Arc<dyn ActionHandler> {
        Arc::clone(&self.handler)
    }

    /// Create an unbound instance of `program`
    pub fn instantiate(&self, program: Program) -> ProgramInstance {
        ProgramInstance::new(Arc::new(program), self.handler(), self.config.clone())
    }
}
