use crate::IntegrationRegistry;
use std::sync::Arc;
use weavecore::{
    CompletionRequest, ExecutionMode, JsonMap, NodeId, ReasoningClient, StepError, AI_SIMULATED,
};

/// Standard instructions appended to every node's system prompt on the ai
/// path, demanding structured output the parse pipeline can consume.
const STRUCTURED_OUTPUT_INSTRUCTIONS: &str = "\
Respond with a single JSON object of the shape \
{\"output\": {...}, \"summary\": \"...\"}. \
Produce concrete values, never placeholder text.";

/// Everything the executor needs to resolve one node, snapshotted so the
/// engine keeps exclusive ownership of the definition while tasks run.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub node_id: NodeId,
    pub name: String,
    pub system_prompt: Option<String>,
    pub execution_mode: ExecutionMode,
    pub integration_id: Option<String>,
    /// Input resolved by the engine from upstream outputs
    pub input: JsonMap,
    /// The workflow's original goal text
    pub goal: String,
}

/// Resolved node output plus provenance
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub output: JsonMap,
    pub data_source: String,
}

/// Resolves a single node's output: ai-only, integration-only, or hybrid
pub struct StepExecutor {
    registry: Arc<IntegrationRegistry>,
    reasoning: Arc<dyn ReasoningClient>,
}

impl StepExecutor {
    pub fn new(registry: Arc<IntegrationRegistry>, reasoning: Arc<dyn ReasoningClient>) -> Self {
        Self {
            registry,
            reasoning,
        }
    }

    pub fn registry(&self) -> &Arc<IntegrationRegistry> {
        &self.registry
    }

    pub async fn execute(&self, ctx: StepContext) -> Result<StepOutcome, StepError> {
        match ctx.execution_mode {
            ExecutionMode::Ai => self.execute_ai(&ctx, None).await,
            ExecutionMode::Integration => self.execute_integration(&ctx).await,
            ExecutionMode::Hybrid => self.execute_hybrid(&ctx).await,
        }
    }

    /// Integration mode: the node's output is exactly the adapter's data
    async fn execute_integration(&self, ctx: &StepContext) -> Result<StepOutcome, StepError> {
        let adapter = self.resolve_adapter(ctx)?;
        let result = adapter.execute(ctx.input.clone()).await;
        if result.success {
            Ok(StepOutcome {
                output: result.data,
                data_source: result.source,
            })
        } else {
            Err(StepError::Adapter(
                result
                    .error
                    .unwrap_or_else(|| format!("Integration '{}' failed", adapter.id())),
            ))
        }
    }

    /// Hybrid mode: live adapter data grounds the model call; adapter
    /// failure degrades to the plain ai path with simulated provenance.
    async fn execute_hybrid(&self, ctx: &StepContext) -> Result<StepOutcome, StepError> {
        let adapter = self.resolve_adapter(ctx)?;
        let result = adapter.execute(ctx.input.clone()).await;
        if result.success {
            tracing::debug!(
                node = %ctx.node_id,
                source = %result.source,
                "Grounding model call with live integration data"
            );
            let outcome = self.execute_ai(ctx, Some(result.data)).await?;
            Ok(StepOutcome {
                output: outcome.output,
                data_source: result.source,
            })
        } else {
            tracing::warn!(
                node = %ctx.node_id,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Integration failed, falling back to simulated output"
            );
            self.execute_ai(ctx, None).await
        }
    }

    /// Ai mode: prompt the reasoning collaborator and defensively parse
    async fn execute_ai(
        &self,
        ctx: &StepContext,
        grounding: Option<JsonMap>,
    ) -> Result<StepOutcome, StepError> {
        let system_prompt = match &ctx.system_prompt {
            Some(prompt) => format!("{}\n\n{}", prompt, STRUCTURED_OUTPUT_INSTRUCTIONS),
            None => format!(
                "You are the agent \"{}\".\n\n{}",
                ctx.name, STRUCTURED_OUTPUT_INSTRUCTIONS
            ),
        };

        let mut resolved = ctx.input.clone();
        if let Some(data) = grounding {
            resolved.insert("liveData".to_string(), serde_json::Value::Object(data));
        }

        let request = CompletionRequest {
            system_prompt,
            resolved_input: serde_json::Value::Object(resolved),
            goal: ctx.goal.clone(),
        };

        let response = self.reasoning.complete(&request).await?;
        Ok(StepOutcome {
            output: parse_model_response(&response),
            data_source: AI_SIMULATED.to_string(),
        })
    }

    fn resolve_adapter(
        &self,
        ctx: &StepContext,
    ) -> Result<Arc<dyn weavecore::IntegrationAdapter>, StepError> {
        let id = ctx
            .integration_id
            .as_deref()
            .ok_or_else(|| StepError::Adapter("No integration assigned".to_string()))?;
        self.registry
            .get(id)
            .ok_or_else(|| StepError::Adapter(format!("Integration not registered: {}", id)))
    }
}

/// Parse a model response into a node output object.
///
/// Three-step pipeline, never fatal: strict JSON parse, then extraction of
/// the outermost brace-delimited span, then a raw-text envelope.
pub fn parse_model_response(text: &str) -> JsonMap {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(text) {
        return map;
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&text[start..=end]) {
                return map;
            }
        }
    }

    raw_envelope(text)
}

fn raw_envelope(text: &str) -> JsonMap {
    let summary: String = text.trim().chars().take(200).collect();
    let mut output = JsonMap::new();
    output.insert(
        "rawResponse".to_string(),
        serde_json::Value::String(text.to_string()),
    );
    let mut map = JsonMap::new();
    map.insert("output".to_string(), serde_json::Value::Object(output));
    map.insert("summary".to_string(), serde_json::Value::String(summary));
    map
}
