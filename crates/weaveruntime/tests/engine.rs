use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use weavecore::{
    CompletionRequest, ExecutionMode, IntegrationAdapter, IntegrationResult, JsonMap, ModelError,
    NodeStatus, ReasoningClient, WorkflowDefinition, WorkflowError, WorkflowNode, AI_SIMULATED,
};
use weaveruntime::{IntegrationRegistry, RunStatus, RuntimeConfig, WeaveRuntime};

fn data(value: serde_json::Value) -> JsonMap {
    value.as_object().cloned().expect("object literal")
}

enum Behavior {
    Succeed(JsonMap),
    Fail(String),
    /// Sleep, then succeed
    Delay(Duration, JsonMap),
    /// Echo the received input back as data
    Echo,
    /// Fail on the first call, succeed afterwards
    FailOnce(JsonMap),
}

struct StubAdapter {
    id: String,
    source: String,
    behavior: Behavior,
    seen: Mutex<Option<JsonMap>>,
    calls: AtomicU32,
}

impl StubAdapter {
    fn new(id: &str, source: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            source: source.to_string(),
            behavior,
            seen: Mutex::new(None),
            calls: AtomicU32::new(0),
        })
    }

    fn seen_input(&self) -> Option<JsonMap> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntegrationAdapter for StubAdapter {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.id
    }
    fn description(&self) -> &str {
        "test stub"
    }
    fn category(&self) -> &str {
        "test"
    }
    fn keywords(&self) -> &[&str] {
        &[]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        *self.seen.lock().unwrap() = Some(input);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed(payload) => IntegrationResult::ok(&self.source, payload.clone()),
            Behavior::Fail(reason) => IntegrationResult::fail(&self.source, reason.clone()),
            Behavior::Delay(duration, payload) => {
                tokio::time::sleep(*duration).await;
                IntegrationResult::ok(&self.source, payload.clone())
            }
            Behavior::Echo => {
                let input = self.seen.lock().unwrap().clone().unwrap_or_default();
                IntegrationResult::ok(&self.source, input)
            }
            Behavior::FailOnce(payload) => {
                if call == 0 {
                    IntegrationResult::fail(&self.source, "transient outage")
                } else {
                    IntegrationResult::ok(&self.source, payload.clone())
                }
            }
        }
    }
}

/// Reasoning stub that returns a canned response and records every request.
/// When the resolved input carries live grounding data, its fields are
/// echoed into the response so downstream nodes see them.
struct StubReasoning {
    response: String,
    requests: Mutex<Vec<CompletionRequest>>,
    ground: bool,
}

impl StubReasoning {
    fn canned(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            requests: Mutex::new(Vec::new()),
            ground: false,
        })
    }

    fn grounding() -> Arc<Self> {
        Arc::new(Self {
            response: r#"{"output": {"note": "no grounding"}, "summary": "done"}"#.to_string(),
            requests: Mutex::new(Vec::new()),
            ground: true,
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningClient for StubReasoning {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.ground {
            if let Some(live) = request.resolved_input.get("liveData") {
                let mut map = live.as_object().cloned().unwrap_or_default();
                map.insert("summary".to_string(), json!("grounded"));
                return Ok(serde_json::Value::Object(map).to_string());
            }
        }
        Ok(self.response.clone())
    }
}

struct OfflineReasoning;

#[async_trait]
impl ReasoningClient for OfflineReasoning {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ModelError> {
        Err(ModelError::Request("model offline".to_string()))
    }
}

fn runtime(
    adapters: Vec<Arc<dyn IntegrationAdapter>>,
    reasoning: Arc<dyn ReasoningClient>,
) -> WeaveRuntime {
    runtime_with_config(adapters, reasoning, RuntimeConfig::default())
}

fn runtime_with_config(
    adapters: Vec<Arc<dyn IntegrationAdapter>>,
    reasoning: Arc<dyn ReasoningClient>,
    config: RuntimeConfig,
) -> WeaveRuntime {
    let mut registry = IntegrationRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    WeaveRuntime::new(Arc::new(registry), reasoning, config)
}

fn integration_node(id: &str, adapter: &str) -> WorkflowNode {
    WorkflowNode::new(id, id)
        .with_mode(ExecutionMode::Integration)
        .with_integration(adapter)
}

#[tokio::test]
async fn cyclic_definition_is_rejected_before_execution() {
    let adapter = StubAdapter::new("stub", "stub-api", Behavior::Succeed(JsonMap::new()));
    let runtime = runtime(vec![adapter], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("cycle", "goal");
    workflow.add_node(integration_node("a", "stub"));
    workflow.add_node(integration_node("b", "stub"));
    workflow.connect("a", "b", "");
    workflow.connect("b", "a", "");

    let result = runtime.execute(&mut workflow, JsonMap::new()).await;
    assert!(matches!(result, Err(WorkflowError::CyclicDependency)));
    // No node ever left idle
    assert!(workflow.nodes.iter().all(|n| n.status == NodeStatus::Idle));
}

#[tokio::test]
async fn dangling_edge_is_rejected() {
    let adapter = StubAdapter::new("stub", "stub-api", Behavior::Succeed(JsonMap::new()));
    let runtime = runtime(vec![adapter], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("dangling", "goal");
    workflow.add_node(integration_node("a", "stub"));
    workflow.connect("a", "ghost", "");

    let result = runtime.execute(&mut workflow, JsonMap::new()).await;
    assert!(matches!(result, Err(WorkflowError::DanglingEdge { .. })));
}

#[tokio::test]
async fn unknown_integration_is_rejected() {
    let runtime = runtime(vec![], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("unknown", "goal");
    workflow.add_node(integration_node("a", "nonexistent"));

    let result = runtime.execute(&mut workflow, JsonMap::new()).await;
    assert!(matches!(
        result,
        Err(WorkflowError::UnknownIntegration { .. })
    ));
}

#[tokio::test]
async fn integration_node_without_assignment_is_rejected() {
    let runtime = runtime(vec![], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("missing", "goal");
    workflow.add_node(WorkflowNode::new("a", "a").with_mode(ExecutionMode::Integration));

    let result = runtime.execute(&mut workflow, JsonMap::new()).await;
    assert!(matches!(
        result,
        Err(WorkflowError::MissingIntegration { .. })
    ));
}

#[tokio::test]
async fn failure_skips_the_whole_downstream_chain() {
    let broken = StubAdapter::new("broken", "broken-api", Behavior::Fail("boom".to_string()));
    let fine = StubAdapter::new("fine", "fine-api", Behavior::Succeed(data(json!({"x": 1}))));
    let runtime = runtime(vec![broken, fine], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("chain", "goal");
    workflow.add_node(integration_node("a", "broken"));
    workflow.add_node(integration_node("b", "fine"));
    workflow.add_node(integration_node("c", "fine"));
    workflow.connect("a", "b", "");
    workflow.connect("b", "c", "");

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Failed);

    let a = workflow.find_node("a").unwrap();
    assert_eq!(a.status, NodeStatus::Failed);
    assert_eq!(a.error.as_deref(), Some("Integration failed: boom"));

    for id in ["b", "c"] {
        let node = workflow.find_node(id).unwrap();
        assert_eq!(node.status, NodeStatus::Skipped);
        assert!(node.output.is_none());
        assert!(node.error.is_none());
    }
}

#[tokio::test]
async fn mixed_predecessor_outcomes_skip_the_consumer() {
    let ok = StubAdapter::new("ok", "ok-api", Behavior::Succeed(data(json!({"x": 1}))));
    let bad = StubAdapter::new("bad", "bad-api", Behavior::Fail("nope".to_string()));
    let runtime = runtime(vec![ok, bad], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("fan-in", "goal");
    workflow.add_node(integration_node("a", "ok"));
    workflow.add_node(integration_node("b", "bad"));
    workflow.add_node(integration_node("c", "ok"));
    workflow.connect("a", "c", "");
    workflow.connect("b", "c", "");

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Failed);
    assert_eq!(workflow.find_node("a").unwrap().status, NodeStatus::Completed);
    assert_eq!(workflow.find_node("b").unwrap().status, NodeStatus::Failed);
    assert_eq!(workflow.find_node("c").unwrap().status, NodeStatus::Skipped);
}

#[tokio::test]
async fn independent_siblings_execute_concurrently() {
    let slow = StubAdapter::new(
        "slow",
        "slow-api",
        Behavior::Delay(Duration::from_millis(100), data(json!({"x": 1}))),
    );
    let runtime = runtime(vec![slow], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("fan-out", "goal");
    workflow.add_node(integration_node("a", "slow"));
    workflow.add_node(integration_node("b", "slow"));
    workflow.add_node(integration_node("c", "slow"));
    workflow.connect("a", "b", "");
    workflow.connect("a", "c", "");

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);

    let b = workflow.find_node("b").unwrap();
    let c = workflow.find_node("c").unwrap();
    // Overlapping execution windows prove the siblings ran in parallel
    assert!(b.started_at.unwrap() < c.completed_at.unwrap());
    assert!(c.started_at.unwrap() < b.completed_at.unwrap());
}

#[tokio::test]
async fn nodes_never_start_before_their_predecessors_finish() {
    let quick = StubAdapter::new(
        "quick",
        "quick-api",
        Behavior::Delay(Duration::from_millis(20), data(json!({"x": 1}))),
    );
    let runtime = runtime(vec![quick], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("diamond", "goal");
    for id in ["a", "b", "c", "d"] {
        workflow.add_node(integration_node(id, "quick"));
    }
    workflow.connect("a", "b", "");
    workflow.connect("a", "c", "");
    workflow.connect("b", "d", "");
    workflow.connect("c", "d", "");

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);

    for (pred, succ) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
        let pred_done = workflow.find_node(pred).unwrap().completed_at.unwrap();
        let succ_start = workflow.find_node(succ).unwrap().started_at.unwrap();
        assert!(
            succ_start >= pred_done,
            "{} started before {} completed",
            succ,
            pred
        );
    }
}

#[tokio::test]
async fn hybrid_success_keeps_live_provenance() {
    let live = StubAdapter::new(
        "feed",
        "feed-api",
        Behavior::Succeed(data(json!({"items": [1, 2, 3]}))),
    );
    let reasoning = StubReasoning::grounding();
    let runtime = runtime(vec![live], reasoning.clone());

    let mut workflow = WorkflowDefinition::new("hybrid", "goal");
    workflow.add_node(
        WorkflowNode::new("h", "h")
            .with_mode(ExecutionMode::Hybrid)
            .with_integration("feed"),
    );

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);

    let node = workflow.find_node("h").unwrap();
    assert_eq!(node.data_source.as_deref(), Some("feed-api"));
    assert_ne!(node.data_source.as_deref(), Some(AI_SIMULATED));
    // Adapter data reached the model as grounding context
    let request = &reasoning.requests()[0];
    assert_eq!(
        request.resolved_input["liveData"]["items"],
        json!([1, 2, 3])
    );
}

#[tokio::test]
async fn hybrid_adapter_failure_degrades_to_simulated_output() {
    let dead = StubAdapter::new("dead", "dead-api", Behavior::Fail("offline".to_string()));
    let runtime = runtime(
        vec![dead],
        StubReasoning::canned(r#"{"output": {"estimate": 10}, "summary": "guessed"}"#),
    );

    let mut workflow = WorkflowDefinition::new("hybrid-fallback", "goal");
    workflow.add_node(
        WorkflowNode::new("h", "h")
            .with_mode(ExecutionMode::Hybrid)
            .with_integration("dead"),
    );

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    // Graceful degradation: the node completes on the ai path
    assert_eq!(summary.status, RunStatus::Completed);
    let node = workflow.find_node("h").unwrap();
    assert_eq!(node.status, NodeStatus::Completed);
    assert_eq!(node.data_source.as_deref(), Some(AI_SIMULATED));
    assert!(node.error.is_none());
}

#[tokio::test]
async fn ai_failure_fails_the_node_and_skips_downstream() {
    let runtime = runtime(vec![], Arc::new(OfflineReasoning));

    let mut workflow = WorkflowDefinition::new("ai-fail", "goal");
    workflow.add_node(WorkflowNode::new("think", "think"));
    workflow.add_node(WorkflowNode::new("write", "write"));
    workflow.connect("think", "write", "");

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Failed);
    let think = workflow.find_node("think").unwrap();
    assert_eq!(think.status, NodeStatus::Failed);
    assert!(think.error.as_deref().unwrap().contains("model offline"));
    assert_eq!(workflow.find_node("write").unwrap().status, NodeStatus::Skipped);
}

#[tokio::test]
async fn predecessor_outputs_merge_in_edge_declaration_order() {
    let first = StubAdapter::new(
        "first",
        "first-api",
        Behavior::Succeed(data(json!({"k": "from-first", "onlyFirst": true}))),
    );
    let second = StubAdapter::new(
        "second",
        "second-api",
        Behavior::Succeed(data(json!({"k": "from-second"}))),
    );
    let sink = StubAdapter::new("sink", "sink-api", Behavior::Echo);
    let runtime = runtime(
        vec![first, second, sink.clone()],
        StubReasoning::canned("{}"),
    );

    let mut workflow = WorkflowDefinition::new("merge", "goal");
    workflow.add_node(integration_node("a", "first"));
    workflow.add_node(integration_node("b", "second"));
    workflow.add_node(integration_node("c", "sink"));
    workflow.connect("a", "c", "");
    workflow.connect("b", "c", "");

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);

    let seen = sink.seen_input().unwrap();
    // Last declared edge wins the collision, union keeps the rest
    assert_eq!(seen["k"], "from-second");
    assert_eq!(seen["onlyFirst"], true);
}

#[tokio::test]
async fn seed_input_reaches_roots_and_flows_down_chains() {
    let root = StubAdapter::new(
        "root",
        "root-api",
        Behavior::Succeed(data(json!({"fetched": 3}))),
    );
    let sink = StubAdapter::new("sink", "sink-api", Behavior::Echo);
    let runtime = runtime(vec![root.clone(), sink.clone()], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("seed", "goal");
    workflow.add_node(integration_node("a", "root"));
    workflow.add_node(integration_node("b", "sink"));
    workflow.connect("a", "b", "");

    let seed = data(json!({"query": "competitor pricing"}));
    runtime.execute(&mut workflow, seed).await.unwrap();

    assert_eq!(root.seen_input().unwrap()["query"], "competitor pricing");
    let seen = sink.seen_input().unwrap();
    assert_eq!(seen["query"], "competitor pricing");
    assert_eq!(seen["fetched"], 3);
}

#[tokio::test]
async fn rerun_resets_execution_state() {
    let flaky = StubAdapter::new(
        "flaky",
        "flaky-api",
        Behavior::FailOnce(data(json!({"x": 1}))),
    );
    let runtime = runtime(vec![flaky], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("rerun", "goal");
    workflow.add_node(integration_node("a", "flaky"));
    workflow.add_node(integration_node("b", "flaky"));
    workflow.connect("a", "b", "");

    let first = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(first.status, RunStatus::Failed);
    assert!(workflow.find_node("a").unwrap().error.is_some());

    let second = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(second.status, RunStatus::Completed);
    let a = workflow.find_node("a").unwrap();
    assert_eq!(a.status, NodeStatus::Completed);
    // Prior failure left no residue after the reset
    assert!(a.error.is_none());
}

#[tokio::test]
async fn timed_out_node_counts_as_failed() {
    let stuck = StubAdapter::new(
        "stuck",
        "stuck-api",
        Behavior::Delay(Duration::from_secs(30), JsonMap::new()),
    );
    let fine = StubAdapter::new("fine", "fine-api", Behavior::Succeed(JsonMap::new()));
    let config = RuntimeConfig {
        node_timeout_ms: 50,
        ..RuntimeConfig::default()
    };
    let runtime = runtime_with_config(vec![stuck, fine], StubReasoning::canned("{}"), config);

    let mut workflow = WorkflowDefinition::new("timeout", "goal");
    workflow.add_node(integration_node("a", "stuck"));
    workflow.add_node(integration_node("b", "fine"));
    workflow.connect("a", "b", "");

    let summary = runtime.execute(&mut workflow, JsonMap::new()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Failed);
    let a = workflow.find_node("a").unwrap();
    assert_eq!(a.status, NodeStatus::Failed);
    assert!(a.error.as_deref().unwrap().contains("Timeout"));
    assert_eq!(workflow.find_node("b").unwrap().status, NodeStatus::Skipped);
}

#[tokio::test]
async fn cancellation_skips_remaining_nodes_without_errors() {
    let slow = StubAdapter::new(
        "slow",
        "slow-api",
        Behavior::Delay(Duration::from_secs(30), JsonMap::new()),
    );
    let runtime = runtime(vec![slow], StubReasoning::canned("{}"));

    let mut workflow = WorkflowDefinition::new("cancel", "goal");
    workflow.add_node(integration_node("a", "slow"));
    workflow.add_node(integration_node("b", "slow"));
    workflow.connect("a", "b", "");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let summary = runtime
        .execute_with_token(&mut workflow, JsonMap::new(), cancel)
        .await
        .unwrap();

    // The run terminated promptly instead of waiting out the slow adapter
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.status, RunStatus::Failed);
    for id in ["a", "b"] {
        let node = workflow.find_node(id).unwrap();
        assert_eq!(node.status, NodeStatus::Skipped);
        assert!(node.error.is_none());
    }
}

#[tokio::test]
async fn search_then_summarize_end_to_end() {
    let results = json!([
        { "title": "Acme pricing", "url": "https://acme.example/pricing" },
        { "title": "Globex plans", "url": "https://globex.example/plans" },
        { "title": "Initech tiers", "url": "https://initech.example/tiers" },
    ]);
    let search = StubAdapter::new(
        "web-search",
        "web-search-api",
        Behavior::Succeed(data(json!({ "results": results, "count": 3 }))),
    );
    let reasoning = StubReasoning::grounding();
    let runtime = runtime(vec![search], reasoning.clone());

    let mut workflow =
        WorkflowDefinition::new("Pricing digest", "competitor pricing");
    workflow.add_node(
        WorkflowNode::new("search", "Search")
            .with_mode(ExecutionMode::Hybrid)
            .with_integration("web-search"),
    );
    workflow.add_node(
        WorkflowNode::new("summarize", "Summarize")
            .with_mode(ExecutionMode::Ai)
            .with_prompt("Summarize the findings."),
    );
    workflow.connect("search", "summarize", "search results");

    let seed = data(json!({ "query": "competitor pricing" }));
    let summary = runtime.execute(&mut workflow, seed).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    let search_node = workflow.find_node("search").unwrap();
    assert_eq!(search_node.data_source.as_deref(), Some("web-search-api"));
    assert_ne!(search_node.data_source.as_deref(), Some(AI_SIMULATED));

    // The summarizer's input carries the three live results forward
    let summarize_node = workflow.find_node("summarize").unwrap();
    assert_eq!(
        summarize_node.input["results"].as_array().unwrap().len(),
        3
    );
    assert_eq!(summarize_node.data_source.as_deref(), Some(AI_SIMULATED));

    // Both model calls saw the original goal
    assert!(reasoning.requests().iter().all(|r| r.goal == "competitor pricing"));
}
