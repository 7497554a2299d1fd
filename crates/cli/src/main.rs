//! ciselect CLI - run target task selection against JSON dumps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ciselect_collab::{GitVcs, HttpIndexer, HttpPushlog, RetryPolicy};
use ciselect_core::{GraphConfig, JsonMap, Parameters, TaskGraph};
use ciselect_selectors::{global, select, Environment, SelectionContext};
use ciselect_try::{parse_message, TryOptions};

#[derive(Parser)]
#[command(name = "ciselect")]
#[command(about = "Pick the CI tasks to schedule for a push", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a selector
    Select {
        /// Full task graph (label -> task JSON)
        #[arg(long)]
        graph: PathBuf,
        /// Push parameters (JSON)
        #[arg(long)]
        parameters: PathBuf,
        /// Graph configuration (JSON)
        #[arg(long)]
        graph_config: PathBuf,
        /// Selector name; defaults to the `target_tasks_method` parameter
        #[arg(long)]
        selector: Option<String>,
        /// Restrict the result to these kinds
        #[arg(long = "target-kind")]
        target_kinds: Vec<String>,
        /// Root URL of the task index; without it the index is empty
        #[arg(long)]
        index_root_url: Option<String>,
        /// Source checkout for commit messages
        #[arg(long, default_value = ".")]
        checkout: PathBuf,
        /// Do not query the pushlog or the checkout
        #[arg(long)]
        offline: bool,
        /// Attempts per collaborator call
        #[arg(long, default_value = "5")]
        max_attempts: u32,
        /// Print the full report, annotations included, as JSON
        #[arg(long)]
        annotations: bool,
    },
    /// List registered selectors
    List,
    /// Show how a try syntax message is parsed
    ParseTry {
        /// Commit message containing a `try:` line
        message: String,
        /// Resolve against this task graph
        #[arg(long)]
        graph: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Select {
            graph,
            parameters,
            graph_config,
            selector,
            target_kinds,
            index_root_url,
            checkout,
            offline,
            max_attempts,
            annotations,
        } => {
            let graph = TaskGraph::from_json(&read(&graph)?).context("Invalid task graph")?;
            let mut parameters = Parameters::from_json(&read(&parameters)?).context("Invalid parameters")?;
            let graph_config = GraphConfig::from_json(&read(&graph_config)?).context("Invalid graph config")?;

            if !target_kinds.is_empty() {
                let mut overrides = JsonMap::new();
                overrides.insert(
                    "target-kinds".to_string(),
                    Value::Array(target_kinds.into_iter().map(Value::String).collect()),
                );
                parameters = parameters.with_overrides(overrides);
            }

            let name = match selector {
                Some(name) => name,
                None => parameters
                    .str("target_tasks_method")
                    .context("No --selector given and no target_tasks_method parameter")?
                    .to_string(),
            };

            let mut ctx = SelectionContext::new(graph_config)
                .with_env(Environment::from_process())
                .with_retry(RetryPolicy::new().with_max_attempts(max_attempts))
                .with_checkout(&checkout);
            if let Some(root_url) = index_root_url {
                ctx = ctx.with_indexer(Arc::new(HttpIndexer::new(root_url)));
            }
            if !offline {
                ctx = ctx
                    .with_pushlog(Arc::new(HttpPushlog::new()))
                    .with_vcs(Arc::new(GitVcs::new()));
            }

            let registry = global()?;
            let report = select(registry, &name, &graph, &parameters, &ctx)
                .await
                .with_context(|| format!("Target tasks method '{}' failed", name))?;

            if annotations {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for label in &report.labels {
                    println!("{}", label);
                }
            }
            info!("{} tasks selected", report.labels.len());
        }
        Commands::List => {
            let registry = global()?;
            println!("Selectors ({})", registry.len());
            for name in registry.names() {
                println!("  {}", name);
            }
        }
        Commands::ParseTry { message, graph } => {
            let Some(args) = parse_message(&message)? else {
                println!("No try syntax found");
                return Ok(());
            };
            match graph {
                Some(path) => {
                    let graph = TaskGraph::from_json(&read(&path)?).context("Invalid task graph")?;
                    let options = TryOptions::resolve(&args, &graph)?;
                    println!("{}", serde_json::to_string_pretty(&options)?);
                }
                None => println!("{}", serde_json::to_string_pretty(&args)?),
            }
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
