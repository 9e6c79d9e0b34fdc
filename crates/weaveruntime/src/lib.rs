//! Workflow execution runtime
//!
//! This crate provides the engine that runs workflow definitions as DAGs
//! with parallel node execution, the step executor that resolves a single
//! node's output, and the integration registry.

mod engine;
mod executor;
mod registry;
mod runtime;

pub use engine::{RunStatus, RunSummary, WorkflowEngine};
pub use executor::{StepContext, StepExecutor, StepOutcome};
pub use registry::IntegrationRegistry;
pub use runtime::{RuntimeConfig, WeaveRuntime};
