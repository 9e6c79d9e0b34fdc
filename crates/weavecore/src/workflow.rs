use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// JSON object used for node inputs, outputs and adapter data
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Complete workflow definition as produced by the planner collaborator
///
/// The edge set must induce a DAG over node ids; the engine validates this
/// before any node runs. Node execution fields are owned exclusively by the
/// engine during a run and reset on re-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Original natural-language goal the planner expanded
    pub goal: String,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowDefinition {
    pub fn new(title: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            goal: goal.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: WorkflowNode) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Declare that `target`'s input receives `source`'s output.
    ///
    /// Declaration order is significant: it is the input-merge order when a
    /// node has several predecessors (last writer wins on key collisions).
    pub fn connect(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        label: impl Into<String>,
    ) {
        let source = source.into();
        let target = target.into();
        self.edges.push(WorkflowEdge {
            id: format!("edge-{}-{}", source, target),
            source,
            target,
            label: label.into(),
        });
    }

    pub fn find_node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut WorkflowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Predecessor node ids of `id` in edge declaration order
    pub fn predecessors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |e| e.target == id)
            .map(|e| e.source.as_str())
    }

    /// Reset every node's execution fields to idle, clearing prior results
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }
}

/// One unit of work in the graph
///
/// Identity fields are created by the planner and immutable during a run;
/// the execution fields below `status` are mutated only by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Free-text agent prompt, used only by the ai execution path
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Descriptive capability tags; feed adapter matching, never control flow
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Registered adapter backing integration/hybrid execution
    #[serde(default)]
    pub integration_id: Option<String>,
    pub execution_mode: ExecutionMode,

    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub input: JsonMap,
    #[serde(default)]
    pub output: Option<JsonMap>,
    #[serde(default)]
    pub error: Option<String>,
    /// Provenance: an adapter-reported source id or "ai-simulated"
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Serialized as `duration`, the name the observation surface reads
    #[serde(default, rename = "duration")]
    pub duration_ms: Option<u64>,
}

impl WorkflowNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            icon: None,
            system_prompt: None,
            capabilities: Vec::new(),
            integration_id: None,
            execution_mode: ExecutionMode::Ai,
            status: NodeStatus::Idle,
            input: JsonMap::new(),
            output: None,
            error: None,
            data_source: None,
            started_at: None,
            completed_at: None,
            duration_ms: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_integration(mut self, integration_id: impl Into<String>) -> Self {
        self.integration_id = Some(integration_id.into());
        self
    }

    /// Clear execution state back to idle
    pub fn reset(&mut self) {
        self.status = NodeStatus::Idle;
        self.input = JsonMap::new();
        self.output = None;
        self.error = None;
        self.data_source = None;
        self.started_at = None;
        self.completed_at = None;
        self.duration_ms = None;
    }
}

/// Directed dependency plus data-flow declaration between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    /// Human-readable description of what data flows
    #[serde(default)]
    pub label: String,
}

/// How a node produces its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Ai,
    Integration,
    Hybrid,
}

/// Per-node scheduling state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl NodeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeStatus::Completed | NodeStatus::Failed | NodeStatus::Skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_timing_serializes_under_the_duration_key() {
        let mut node = WorkflowNode::new("a", "A");
        node.duration_ms = Some(42);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["duration"], 42);
        assert!(json.get("durationMs").is_none());
    }

    #[test]
    fn node_timing_deserializes_from_the_duration_key() {
        let node: WorkflowNode = serde_json::from_str(
            r#"{"id": "a", "name": "A", "executionMode": "ai", "duration": 7}"#,
        )
        .unwrap();
        assert_eq!(node.duration_ms, Some(7));
    }
}
