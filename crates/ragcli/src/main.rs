use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use ragcore::{ExecutionEvent, NodeEvent, NodeKind, NodeSpec, Value, Workflow};
use ragproviders::{ProviderSettings, ProviderStack};
use ragruntime::{execution_order, validate, FlowRuntime, NodeDispatcher, RuntimeConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rag")]
#[command(about = "RAG workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file against a query
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// The user query
        #[arg(short, long)]
        query: String,

        /// Session identifier echoed in the result
        #[arg(short, long)]
        session: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node kinds
    Nodes,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            query,
            session,
            verbose,
        } => {
            let default_level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(default_level)),
                )
                .init();

            run_workflow(file, query, session).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

fn build_runtime() -> FlowRuntime {
    let providers = ProviderStack::from_settings(&ProviderSettings::from_env());
    let mut dispatcher = NodeDispatcher::new();
    ragnodes::register_all(&mut dispatcher, providers.collaborators);
    FlowRuntime::with_dispatcher(Arc::new(dispatcher), RuntimeConfig::default())
}

fn print_event(event: ExecutionEvent) {
    match event {
        ExecutionEvent::WorkflowStarted { .. } => {
            println!("▶️  Workflow started");
        }
        ExecutionEvent::NodeStarted { node_id, kind, .. } => {
            println!("  ⚡ Starting node: {} ({})", node_id, kind);
        }
        ExecutionEvent::NodeCompleted {
            node_id,
            duration_ms,
            ..
        } => {
            println!("  ✅ Node {} completed in {}ms", node_id, duration_ms);
        }
        ExecutionEvent::NodeFailed { node_id, error, .. } => {
            println!("  ❌ Node {} failed: {}", node_id, error);
        }
        ExecutionEvent::NodeEvent { node_id, event, .. } => match event {
            NodeEvent::Info { message } => {
                println!("     ℹ️  [{}] {}", node_id, message);
            }
            NodeEvent::Warning { message } => {
                println!("     ⚠️  [{}] {}", node_id, message);
            }
        },
        ExecutionEvent::WorkflowCompleted {
            success,
            duration_ms,
            ..
        } => {
            if success {
                println!("✨ Workflow completed successfully in {}ms", duration_ms);
            } else {
                println!("💥 Workflow failed after {}ms", duration_ms);
            }
        }
    }
}

async fn run_workflow(file: PathBuf, query: String, session: Option<String>) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let workflow = Workflow::from_file(&file)?;

    println!("📋 Workflow: {}", workflow.name);
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Edges: {}", workflow.edges.len());
    println!();

    let runtime = build_runtime();
    let mut events = runtime.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            print_event(event);
        }
    });

    let result = runtime.execute(&workflow.run_request(query, session)).await;

    // Wait for events to finish printing
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", result.execution_id);
    println!("   Executed: {}/{} nodes", result.execution_log.len(), workflow.nodes.len());
    println!("   Time: {}ms", result.execution_time_ms);

    println!();
    println!("🧾 Trace:");
    for entry in &result.execution_log {
        let mark = if entry.success { "✅" } else { "❌" };
        println!("   {} {} ({}) {}ms", mark, entry.node_id, entry.kind, entry.duration_ms);
        for (key, value) in &entry.payload.fields {
            println!("       {}: {}", key, display_value(value));
        }
    }

    println!();
    println!("💬 Response:");
    println!("{}", result.final_response);

    if let Some(errors) = &result.errors {
        println!();
        for error in errors {
            println!("❌ {}", error);
        }
    }

    if !result.success {
        bail!("Workflow execution failed");
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = Workflow::from_file(&file)?;
    let report = validate(&workflow.nodes, &workflow.edges);

    for warning in report.warning_messages() {
        println!("   ⚠️  {}", warning);
    }
    for error in report.error_messages() {
        println!("   ❌ {}", error);
    }

    let order = match execution_order(&workflow.nodes, &workflow.edges) {
        Ok(order) => order,
        Err(e) => bail!("Workflow cannot be scheduled: {}", e),
    };

    if !report.valid {
        bail!("Workflow is invalid");
    }

    println!("✅ Workflow is valid:");
    println!("   Name: {}", workflow.name);
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Edges: {}", workflow.edges.len());
    println!("   Order: {}", order.join(" → "));

    Ok(())
}

fn list_nodes() {
    println!("📦 Available Node Kinds:");
    println!();

    let runtime = build_runtime();
    for descriptor in runtime.dispatcher().describe() {
        let slots = |slots: &[ragcore::Slot]| {
            slots
                .iter()
                .map(|s| format!("{:?}", s).to_lowercase())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("  • {}", descriptor.kind);
        println!("    {}", descriptor.description);
        println!(
            "    reads: [{}]  writes: [{}]",
            slots(&descriptor.reads),
            slots(&descriptor.writes)
        );
    }
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let mut workflow = Workflow::new("Example RAG Workflow");
    workflow.description =
        Some("Answers a question from a document collection with an LLM".to_string());

    let query = workflow.add_node(NodeSpec::new("query", NodeKind::QuerySource));
    let retrieval = workflow.add_node(
        NodeSpec::new("knowledge", NodeKind::Retrieval)
            .with_config("collection", "my_documents")
            .with_config("resultCount", 5i64)
            .with_config("embeddingProvider", "openai"),
    );
    let generation = workflow.add_node(
        NodeSpec::new("llm", NodeKind::Generation)
            .with_config("provider", "openai")
            .with_config("model", "gpt-3.5-turbo")
            .with_config("temperature", 0.7)
            .with_config("useWebSearch", false),
    );
    let sink = workflow.add_node(NodeSpec::new("output", NodeKind::Sink));

    workflow.connect(query, retrieval.clone());
    workflow.connect(retrieval, generation.clone());
    workflow.connect(generation, sink);

    let json = serde_json::to_string_pretty(&workflow)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  rag run --file {} --query \"What do my documents say?\"",
        output.display()
    );

    Ok(())
}
