use crate::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provenance value recorded when a node's output was generated by the
/// reasoning model instead of a live integration call
pub const AI_SIMULATED: &str = "ai-simulated";

/// Request to the external reasoning-model collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub system_prompt: String,
    /// Resolved node input, including any live grounding data
    pub resolved_input: serde_json::Value,
    /// The workflow's original goal text
    pub goal: String,
}

/// Boundary to the reasoning-model collaborator
///
/// The response is free-form text, expected but not guaranteed to be JSON;
/// callers must parse defensively.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}
