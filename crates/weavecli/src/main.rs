use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use weaveadapters::{HttpReasoningClient, ServiceConfig};
use weavecore::{
    ExecutionEvent, ExecutionMode, JsonMap, NodeStatus, WeaveError, WorkflowDefinition,
    WorkflowNode,
};
use weaveruntime::{IntegrationRegistry, RunStatus, RuntimeConfig, WeaveRuntime};

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Agent workflow orchestrator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow definition file
    Run {
        /// Path to a planner-produced workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Seed input as a JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// Per-node timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow definition file
    Validate {
        /// Path to a workflow JSON file
        file: PathBuf,
    },

    /// List registered integrations
    Integrations,

    /// Suggest an integration for a free-text step description
    Suggest {
        /// Step name/description text
        text: String,
    },

    /// Create an example workflow definition
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

fn build_runtime(config: RuntimeConfig) -> Result<WeaveRuntime> {
    let mut registry = IntegrationRegistry::new();
    weaveadapters::register_all(&mut registry, &ServiceConfig::from_env())?;
    Ok(WeaveRuntime::new(
        Arc::new(registry),
        Arc::new(HttpReasoningClient::from_env()?),
        config,
    ))
}

fn load_workflow(path: &Path) -> weavecore::Result<WorkflowDefinition> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn parse_seed(input: Option<String>) -> weavecore::Result<JsonMap> {
    match input {
        Some(text) => match serde_json::from_str(&text)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(WeaveError::Execution(
                "Seed input must be a JSON object".to_string(),
            )),
        },
        None => Ok(JsonMap::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            timeout_ms,
            verbose,
        } => {
            tracing_subscriber::fmt()
                .with_max_level(if verbose {
                    tracing::Level::DEBUG
                } else {
                    tracing::Level::WARN
                })
                .init();

            run_workflow(file, input, timeout_ms).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Integrations => {
            list_integrations()?;
        }

        Commands::Suggest { text } => {
            suggest_integration(&text)?;
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

async fn run_workflow(file: PathBuf, input: Option<String>, timeout_ms: Option<u64>) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let mut workflow = load_workflow(&file)?;

    println!("📋 Workflow: {}", workflow.title);
    println!("   Goal: {}", workflow.goal);
    println!("   Nodes: {}  Edges: {}", workflow.nodes.len(), workflow.edges.len());
    println!();

    let seed_input = parse_seed(input)?;

    let mut config = RuntimeConfig::default();
    if let Some(ms) = timeout_ms {
        config.node_timeout_ms = ms;
    }
    let runtime = build_runtime(config)?;

    // Ctrl-C stops dispatching and skips the rest of the graph
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n🛑 Cancelling run...");
            ctrl_c_token.cancel();
        }
    });

    let mut events = runtime.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::WorkflowStarted { .. } => {
                    println!("▶️  Workflow started");
                }
                ExecutionEvent::NodeStarted { node_id, name, mode, .. } => {
                    println!("  ⚡ Starting {} ({}, {:?})", name, node_id, mode);
                }
                ExecutionEvent::NodeCompleted { node_id, data_source, duration_ms, .. } => {
                    let source = data_source.unwrap_or_else(|| "unknown".to_string());
                    println!("  ✅ {} completed in {}ms [{}]", node_id, duration_ms, source);
                }
                ExecutionEvent::NodeFailed { node_id, error, .. } => {
                    println!("  ❌ {} failed: {}", node_id, error);
                }
                ExecutionEvent::NodeSkipped { node_id, .. } => {
                    println!("  ⏭️  {} skipped", node_id);
                }
                ExecutionEvent::WorkflowCompleted { success, duration_ms, .. } => {
                    if success {
                        println!("✨ Workflow completed successfully in {}ms", duration_ms);
                    } else {
                        println!("💥 Workflow did not fully complete ({}ms)", duration_ms);
                    }
                }
            }
        }
    });

    let summary = runtime
        .execute_with_token(&mut workflow, seed_input, cancel)
        .await?;

    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Run Summary ({})", summary.execution_id);
    println!(
        "   Status: {}",
        match summary.status {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    );
    println!(
        "   Nodes: {} completed, {} failed, {} skipped of {}",
        summary.completed_nodes, summary.failed_nodes, summary.skipped_nodes, summary.total_nodes
    );

    for node in &workflow.nodes {
        match node.status {
            NodeStatus::Completed => {
                if let Some(output) = &node.output {
                    println!();
                    println!(
                        "📤 {} [{}]:",
                        node.name,
                        node.data_source.as_deref().unwrap_or("unknown")
                    );
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::Value::Object(output.clone()))?
                    );
                }
            }
            NodeStatus::Failed => {
                println!();
                println!(
                    "⚠️  {} failed: {}",
                    node.name,
                    node.error.as_deref().unwrap_or("unknown error")
                );
            }
            _ => {}
        }
    }

    Ok(())
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = load_workflow(&file)?;

    let runtime = build_runtime(RuntimeConfig::default())?;
    runtime.validate(&workflow).map_err(WeaveError::Workflow)?;

    println!("✅ Workflow is valid:");
    println!("   Title: {}", workflow.title);
    println!("   Nodes: {}  Edges: {}", workflow.nodes.len(), workflow.edges.len());
    Ok(())
}

fn list_integrations() -> Result<()> {
    println!("📦 Registered Integrations:");
    println!();

    let mut registry = IntegrationRegistry::new();
    weaveadapters::register_all(&mut registry, &ServiceConfig::from_env())?;

    for adapter in registry.all() {
        let auth = if adapter.requires_auth() { " 🔑" } else { "" };
        let connected = if adapter.is_connected() { "●" } else { "○" };
        println!("  {} {} ({}){}", connected, adapter.id(), adapter.category(), auth);
        println!("    {}", adapter.description());
    }
    Ok(())
}

fn suggest_integration(text: &str) -> Result<()> {
    let mut registry = IntegrationRegistry::new();
    weaveadapters::register_all(&mut registry, &ServiceConfig::from_env())?;

    match registry.find_match(text, &[]) {
        Some(id) => println!("💡 Suggested integration: {}", id),
        None => println!("🤷 No integration matches that description"),
    }
    Ok(())
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let mut workflow = WorkflowDefinition::new(
        "Competitor pricing digest",
        "Research competitor pricing and email me a summary",
    );

    let search = WorkflowNode::new("search", "Pricing Researcher")
        .with_description("Find current competitor pricing pages")
        .with_prompt("You research product pricing and extract concrete numbers.")
        .with_capabilities(["web search", "research"])
        .with_mode(ExecutionMode::Hybrid)
        .with_integration("web-search");

    let summarize = WorkflowNode::new("summarize", "Summary Writer")
        .with_description("Condense findings into a short report")
        .with_prompt("You write crisp one-paragraph summaries with bullet highlights.")
        .with_capabilities(["summarization"])
        .with_mode(ExecutionMode::Ai);

    let search_id = workflow.add_node(search);
    let summarize_id = workflow.add_node(summarize);
    workflow.connect(search_id, summarize_id, "search results");

    let json = serde_json::to_string_pretty(&workflow)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  weave run --file {} --input '{{\"query\": \"competitor pricing\"}}'",
        output.display()
    );

    Ok(())
}
