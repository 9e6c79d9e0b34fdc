use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeaveError {
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Definition-level validation errors, raised to the caller before any
/// node executes. All other failures stay local to a node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Cyclic dependency detected")]
    CyclicDependency,

    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Node '{node_id}' references unknown integration '{integration_id}'")]
    UnknownIntegration {
        node_id: String,
        integration_id: String,
    },

    #[error("Node '{node_id}' runs in {mode} mode but has no integration assigned")]
    MissingIntegration { node_id: String, mode: String },
}

/// Node-local execution errors, captured into the node's error field and
/// reflected as a failed status; never thrown out of the engine run loop.
#[derive(Error, Debug, Clone)]
pub enum StepError {
    #[error("Integration failed: {0}")]
    Adapter(String),

    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("Timeout after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Failures talking to the reasoning-model collaborator
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Model endpoint returned status {code}: {body}")]
    Status { code: u16, body: String },
}
