//! Core abstractions for the agentweave orchestrator
//!
//! This crate provides the fundamental types and traits that all other
//! components depend on: the workflow data model, the integration adapter
//! and reasoning-client contracts, the error taxonomy, and the execution
//! event bus. It performs no I/O itself.

mod error;
pub mod events;
mod integration;
mod model;
mod workflow;

pub use error::{ModelError, StepError, WeaveError, WorkflowError};
pub use integration::{IntegrationAdapter, IntegrationResult};
pub use model::{CompletionRequest, ReasoningClient, AI_SIMULATED};
pub use workflow::{
    ExecutionMode, JsonMap, NodeId, NodeStatus, WorkflowDefinition, WorkflowEdge, WorkflowNode,
};
pub use events::*;

/// Result type for weave operations
pub type Result<T> = std::result::Result<T, WeaveError>;
