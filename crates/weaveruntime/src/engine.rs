use crate::executor::{StepContext, StepExecutor, StepOutcome};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use weavecore::{
    EventBus, ExecutionEvent, ExecutionId, JsonMap, NodeId, NodeStatus, StepError,
    WorkflowDefinition, WorkflowError,
};

type TaskResult = (NodeId, Result<StepOutcome, StepError>, u64);

/// Runs a workflow definition as a DAG with parallel node execution
///
/// The engine owns the definition's mutable node state for the duration of
/// a run: tasks receive snapshots and every mutation happens on the run
/// loop when an outcome is applied.
pub struct WorkflowEngine {
    executor: Arc<StepExecutor>,
    event_bus: Arc<EventBus>,
    node_timeout: Duration,
    max_parallel: usize,
}

impl WorkflowEngine {
    pub fn new(
        executor: Arc<StepExecutor>,
        event_bus: Arc<EventBus>,
        node_timeout: Duration,
        max_parallel: usize,
    ) -> Self {
        Self {
            executor,
            event_bus,
            node_timeout,
            max_parallel,
        }
    }

    /// Validate a definition before execution.
    ///
    /// Rejects duplicate node ids, edges referencing unknown nodes,
    /// integration/hybrid nodes without a registered adapter, and cycles.
    /// A rejected definition is untouched: every node stays idle.
    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<(), WorkflowError> {
        let mut seen = HashSet::new();
        for node in &workflow.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(WorkflowError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &workflow.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(WorkflowError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        for node in &workflow.nodes {
            if matches!(
                node.execution_mode,
                weavecore::ExecutionMode::Integration | weavecore::ExecutionMode::Hybrid
            ) {
                let id = node.integration_id.as_deref().ok_or_else(|| {
                    WorkflowError::MissingIntegration {
                        node_id: node.id.clone(),
                        mode: match node.execution_mode {
                            weavecore::ExecutionMode::Integration => "integration".to_string(),
                            _ => "hybrid".to_string(),
                        },
                    }
                })?;
                if self.executor.registry().get(id).is_none() {
                    return Err(WorkflowError::UnknownIntegration {
                        node_id: node.id.clone(),
                        integration_id: id.to_string(),
                    });
                }
            }
        }

        let mut graph = DiGraph::<&str, ()>::new();
        let mut indices = HashMap::new();
        for node in &workflow.nodes {
            indices.insert(node.id.as_str(), graph.add_node(node.id.as_str()));
        }
        for edge in &workflow.edges {
            graph.add_edge(
                indices[edge.source.as_str()],
                indices[edge.target.as_str()],
                (),
            );
        }
        if toposort(&graph, None).is_err() {
            return Err(WorkflowError::CyclicDependency);
        }

        Ok(())
    }

    /// Execute a definition to completion, mutating its node state in place.
    ///
    /// Only validation errors are returned; node-level failures are captured
    /// into each node's error field and reflected in the summary. Re-running
    /// the same definition resets all execution state first.
    pub async fn run(
        &self,
        workflow: &mut WorkflowDefinition,
        seed_input: JsonMap,
        cancel: CancellationToken,
    ) -> Result<RunSummary, WorkflowError> {
        self.validate(workflow)?;
        workflow.reset();

        let execution_id = ExecutionId::new_v4();
        let start = Instant::now();
        self.event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id,
            workflow_id: workflow.id.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(workflow = %workflow.id, %execution_id, "Starting workflow run");

        // Predecessors per node in edge declaration order; this ordering is
        // the caller-visible input merge order.
        let node_ids: Vec<NodeId> = workflow.nodes.iter().map(|n| n.id.clone()).collect();
        let mut predecessors: HashMap<&str, Vec<&str>> = node_ids
            .iter()
            .map(|id| (id.as_str(), Vec::new()))
            .collect();
        for edge in &workflow.edges {
            if let Some(preds) = predecessors.get_mut(edge.target.as_str()) {
                preds.push(edge.source.as_str());
            }
        }
        let predecessors: HashMap<NodeId, Vec<NodeId>> = predecessors
            .into_iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    v.into_iter().map(str::to_string).collect::<Vec<_>>(),
                )
            })
            .collect();

        let mut running: FuturesUnordered<BoxFuture<'static, TaskResult>> =
            FuturesUnordered::new();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.propagate_skips(workflow, &predecessors, execution_id);

            // Dispatch every eligible node, up to the parallel limit
            let eligible: Vec<NodeId> = node_ids
                .iter()
                .filter(|id| self.is_eligible(workflow, &predecessors, id))
                .cloned()
                .collect();
            for node_id in eligible {
                if running.len() >= self.max_parallel {
                    break;
                }
                running.push(self.dispatch(workflow, &predecessors, &node_id, &seed_input, execution_id));
            }

            if running.is_empty() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                result = running.next() => {
                    if let Some((node_id, outcome, duration_ms)) = result {
                        self.apply_outcome(workflow, &node_id, outcome, duration_ms, execution_id);
                    }
                }
            }
        }

        // Dropping in-flight futures aborts their I/O; a slow call can never
        // mutate a cancelled run's results.
        drop(running);
        if cancel.is_cancelled() {
            for node in &mut workflow.nodes {
                if !node.status.is_terminal() {
                    node.status = NodeStatus::Skipped;
                    self.event_bus.emit(ExecutionEvent::NodeSkipped {
                        execution_id,
                        node_id: node.id.clone(),
                        timestamp: Utc::now(),
                    });
                }
            }
            tracing::info!(workflow = %workflow.id, "Run cancelled");
        }

        let summary = self.summarize(workflow, execution_id, start.elapsed().as_millis() as u64);
        self.event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id,
            success: summary.status == RunStatus::Completed,
            duration_ms: summary.duration_ms,
            timestamp: Utc::now(),
        });
        Ok(summary)
    }

    fn is_eligible(
        &self,
        workflow: &WorkflowDefinition,
        predecessors: &HashMap<NodeId, Vec<NodeId>>,
        node_id: &str,
    ) -> bool {
        let Some(node) = workflow.find_node(node_id) else {
            return false;
        };
        node.status == NodeStatus::Idle
            && predecessors[node_id].iter().all(|pred| {
                workflow
                    .find_node(pred)
                    .map(|p| p.status == NodeStatus::Completed)
                    .unwrap_or(false)
            })
    }

    /// Skip is contagious: an idle node with any failed or skipped
    /// predecessor can never run, so mark it skipped immediately and let
    /// the mark cascade to its own descendants.
    fn propagate_skips(
        &self,
        workflow: &mut WorkflowDefinition,
        predecessors: &HashMap<NodeId, Vec<NodeId>>,
        execution_id: ExecutionId,
    ) {
        loop {
            let doomed: Vec<NodeId> = workflow
                .nodes
                .iter()
                .filter(|n| n.status == NodeStatus::Idle)
                .filter(|n| {
                    predecessors[n.id.as_str()].iter().any(|pred| {
                        workflow
                            .find_node(pred)
                            .map(|p| {
                                matches!(p.status, NodeStatus::Failed | NodeStatus::Skipped)
                            })
                            .unwrap_or(false)
                    })
                })
                .map(|n| n.id.clone())
                .collect();
            if doomed.is_empty() {
                break;
            }
            for node_id in doomed {
                if let Some(node) = workflow.find_node_mut(&node_id) {
                    node.status = NodeStatus::Skipped;
                }
                tracing::info!(node = %node_id, "Skipping node: upstream dependency did not complete");
                self.event_bus.emit(ExecutionEvent::NodeSkipped {
                    execution_id,
                    node_id,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Merge inputs, mark the node running, and build its execution future
    fn dispatch(
        &self,
        workflow: &mut WorkflowDefinition,
        predecessors: &HashMap<NodeId, Vec<NodeId>>,
        node_id: &str,
        seed_input: &JsonMap,
        execution_id: ExecutionId,
    ) -> BoxFuture<'static, TaskResult> {
        // Union of predecessor outputs over the seed, applied in edge
        // declaration order so key collisions resolve last-writer-wins.
        let mut input = seed_input.clone();
        for pred in &predecessors[node_id] {
            if let Some(output) = workflow.find_node(pred).and_then(|p| p.output.as_ref()) {
                for (key, value) in output {
                    input.insert(key.clone(), value.clone());
                }
            }
        }

        let goal = workflow.goal.clone();
        let node = workflow
            .find_node_mut(node_id)
            .expect("dispatched node exists");
        node.status = NodeStatus::Running;
        node.started_at = Some(Utc::now());
        node.input = input.clone();

        let ctx = StepContext {
            node_id: node.id.clone(),
            name: node.name.clone(),
            system_prompt: node.system_prompt.clone(),
            execution_mode: node.execution_mode,
            integration_id: node.integration_id.clone(),
            input,
            goal,
        };

        self.event_bus.emit(ExecutionEvent::NodeStarted {
            execution_id,
            node_id: node.id.clone(),
            name: node.name.clone(),
            mode: node.execution_mode,
            timestamp: Utc::now(),
        });
        tracing::info!(node = %node.id, mode = ?node.execution_mode, "Dispatching node");

        let executor = Arc::clone(&self.executor);
        let node_timeout = self.node_timeout;
        let id = ctx.node_id.clone();
        Box::pin(async move {
            let started = Instant::now();
            let result = match timeout(node_timeout, executor.execute(ctx)).await {
                Ok(result) => result,
                Err(_) => Err(StepError::Timeout {
                    seconds: node_timeout.as_secs(),
                }),
            };
            (id, result, started.elapsed().as_millis() as u64)
        })
    }

    fn apply_outcome(
        &self,
        workflow: &mut WorkflowDefinition,
        node_id: &str,
        outcome: Result<StepOutcome, StepError>,
        duration_ms: u64,
        execution_id: ExecutionId,
    ) {
        let Some(node) = workflow.find_node_mut(node_id) else {
            return;
        };
        node.completed_at = Some(Utc::now());
        node.duration_ms = Some(duration_ms);
        match outcome {
            Ok(step) => {
                tracing::info!(node = %node_id, source = %step.data_source, duration_ms, "Node completed");
                node.status = NodeStatus::Completed;
                node.data_source = Some(step.data_source.clone());
                node.output = Some(step.output);
                self.event_bus.emit(ExecutionEvent::NodeCompleted {
                    execution_id,
                    node_id: node.id.clone(),
                    data_source: Some(step.data_source),
                    duration_ms,
                    timestamp: Utc::now(),
                });
            }
            Err(error) => {
                tracing::error!(node = %node_id, %error, "Node failed");
                node.status = NodeStatus::Failed;
                node.error = Some(error.to_string());
                self.event_bus.emit(ExecutionEvent::NodeFailed {
                    execution_id,
                    node_id: node.id.clone(),
                    error: error.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn summarize(
        &self,
        workflow: &WorkflowDefinition,
        execution_id: ExecutionId,
        duration_ms: u64,
    ) -> RunSummary {
        let count = |status: NodeStatus| {
            workflow
                .nodes
                .iter()
                .filter(|n| n.status == status)
                .count()
        };
        let completed = count(NodeStatus::Completed);
        RunSummary {
            execution_id,
            workflow_id: workflow.id.clone(),
            status: if completed == workflow.nodes.len() {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            },
            total_nodes: workflow.nodes.len(),
            completed_nodes: completed,
            failed_nodes: count(NodeStatus::Failed),
            skipped_nodes: count(NodeStatus::Skipped),
            duration_ms,
        }
    }
}

/// Terminal status of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Aggregated result of one workflow run
///
/// Per-node outputs, errors and provenance live on the definition itself.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub execution_id: ExecutionId,
    pub workflow_id: String,
    pub status: RunStatus,
    pub total_nodes: usize,
    pub completed_nodes: usize,
    pub failed_nodes: usize,
    pub skipped_nodes: usize,
    pub duration_ms: u64,
}
