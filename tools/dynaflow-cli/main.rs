use clap::{Parser, Subcommand};
use dynaflow::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Author, check and walk dynamic flows from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a flow document and report structural findings
    Check {
        /// Path to the flow document JSON file
        flow_path: String,
        /// Write the compiled flow as a binary snapshot to this path
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Walk a session through a flow
    Run {
        /// Path to the flow document JSON file, or a snapshot with --from-snapshot
        flow_path: String,
        /// JSON object mapping node ids to answers (null skips an optional node)
        answers_path: Option<String>,
        /// Treat the flow path as a binary snapshot written by `check --snapshot`
        #[arg(long)]
        from_snapshot: bool,
        /// Prompt for each answer instead of reading an answers file
        #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
        human: bool,
    },
    /// List the registered node types and their configuration fields
    Types,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let registry = Arc::new(NodeTypeRegistry::default());
    match cli.command {
        Command::Check {
            flow_path,
            snapshot,
        } => run_check(&registry, &flow_path, snapshot.as_deref()),
        Command::Run {
            flow_path,
            answers_path,
            from_snapshot,
            human,
        } => run_session(registry, &flow_path, answers_path.as_deref(), from_snapshot, human),
        Command::Types => print_types(&registry),
    }
}

fn init_logging(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn compile_document(registry: &Arc<NodeTypeRegistry>, flow_path: &str) -> CompiledFlow {
    let document = FlowDocument::from_file(flow_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load flow '{}': {}", flow_path, e)));
    FlowCompiler::new(registry.clone())
        .compile(document)
        .unwrap_or_else(|e| exit_with_error(&format!("Flow compilation failed: {}", e)))
}

fn run_check(registry: &Arc<NodeTypeRegistry>, flow_path: &str, snapshot: Option<&str>) {
    let start = Instant::now();
    let compiled = compile_document(registry, flow_path);
    let flow = &compiled.flow;

    println!(
        "Flow '{}' ({}) compiled in {:?}: {} nodes, {} transitions, entry '{}'",
        flow.id,
        flow.name,
        start.elapsed(),
        flow.nodes.len(),
        flow.edges().count(),
        flow.entry_node_id
    );
    if compiled.warnings.is_empty() {
        println!("  -> No warnings");
    }
    for warning in &compiled.warnings {
        println!("  -> Warning: {}", warning);
    }

    if let Some(path) = snapshot {
        flow.save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write snapshot: {}", e)));
        println!("Snapshot written to '{}'", path);
    }
}

fn run_session(
    registry: Arc<NodeTypeRegistry>,
    flow_path: &str,
    answers_path: Option<&str>,
    from_snapshot: bool,
    human: bool,
) {
    let flow = if from_snapshot {
        Flow::from_file(flow_path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load snapshot: {}", e)))
    } else {
        compile_document(&registry, flow_path).flow
    };

    let answers: HashMap<String, serde_json::Value> = match answers_path {
        Some(path) if !human => {
            let content = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read answers file '{}': {}", path, e))
            });
            serde_json::from_str(&content)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse answers JSON: {}", e)))
        }
        _ => HashMap::new(),
    };

    let flows = Arc::new(InMemoryFlowStore::new());
    let responses = Arc::new(InMemoryResponseStore::new());
    let flow_id = flows
        .put(flow)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to store flow: {}", e)));
    let flow = flows
        .get(&flow_id.flow_id, Some(flow_id.version))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load flow: {}", e)));

    let engine = SessionEngine::builder(flows, responses)
        .with_registry(registry)
        .build();
    let session = engine
        .start(&flow_id.flow_id, Some(flow_id.version))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start session: {}", e)));
    info!(session = %session.id, "Walking flow {}", flow_id);

    let mut current = session.current_node_id.clone();
    while let Some(node_id) = current {
        let node = flow
            .node(&node_id)
            .unwrap_or_else(|| exit_with_error(&format!("Node '{}' vanished from the flow", node_id)));

        let raw: RawAnswer = if human {
            prompt_for_answer(node)
        } else {
            match answers.get(&node_id) {
                Some(value) => value.clone().into(),
                None if !node.required => RawAnswer::Skip,
                None => exit_with_error(&format!("No answer provided for required node '{}'", node_id)),
            }
        };

        match engine.submit_answer(&session.id, &node_id, raw) {
            Ok(next) => current = next.node_id().map(str::to_string),
            Err(SessionError::Validation(e)) if human => {
                println!("  !! {}", e);
                current = Some(node_id);
            }
            Err(e) => exit_with_error(&format!("Submission for '{}' failed: {}", node_id, e)),
        }
    }

    let finished = engine
        .session(&session.id)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load session: {}", e)));
    println!("\nSession {} is {}", finished.id, finished.status);
    println!("Path: {}", finished.path.join(" -> "));
    for answer in finished.answers.iter() {
        let label = flow.node(&answer.node_id).map_or("", |n| n.label.as_str());
        println!("  {:<16} {:<32} {}", answer.node_id, label, answer.value);
    }
}

fn print_types(registry: &NodeTypeRegistry) {
    for (name, kind, schema) in registry.describe() {
        if name == kind.as_str() {
            println!("{}", name);
        } else {
            println!("{} (as {})", name, kind);
        }
        print!("{}", schema);
    }
}

/// Prompts for one node's answer. An empty line skips the node.
fn prompt_for_answer(node: &Node) -> RawAnswer {
    let hint = match &node.config {
        NodeConfig::Choice(c) => format!(" [{}]", c.options.join("/")),
        NodeConfig::Date(_) => " [YYYY-MM-DD]".to_string(),
        NodeConfig::Number(c) => match (c.min, c.max) {
            (Some(min), Some(max)) => format!(" [{}..{}]", min, max),
            _ => String::new(),
        },
        _ => String::new(),
    };
    let optional = if node.required { "" } else { " (optional)" };
    let line = prompt_for_input(&format!("{}{}{}", node.label, hint, optional));

    if line.is_empty() {
        return RawAnswer::Skip;
    }
    // File references are typed as JSON objects; everything else is plain text.
    match node.kind() {
        NodeKind::FileUpload => serde_json::from_str::<serde_json::Value>(&line)
            .map(RawAnswer::from)
            .unwrap_or_else(|_| RawAnswer::text(&line)),
        _ => RawAnswer::text(&line),
    }
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str) -> String {
    let mut line = String::new();
    print!("> {}: ", prompt_text);
    io::stdout().flush().ok();

    if let Err(e) = io::stdin().read_line(&mut line) {
        exit_with_error(&format!("Failed to read input: {}", e));
    }
    line.trim().to_string()
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
