//! `sqlflow` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`    — start the API server.
//! - `generate` — translate one natural-language request and print the result.
//! - `steps`    — turn a steps JSON file into flowchart JSON (no model calls).
//! - `validate` — check a flowchart JSON file's structural invariants.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flowchart::{validate_flowchart, EditorConfig, FlowChart, FlowChartSnapshot, FlowEditor};
use gateway::{GatewayConfig, QwenGateway, Step};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sqlflow",
    about = "Natural language to SQL, edited as a flowchart",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Overrides for the model connection; unset flags fall back to
/// `QWEN_API_KEY`, `QWEN_MODEL_URL`, `QWEN_MODEL` and
/// `SQLFLOW_GATEWAY_TIMEOUT_SECS`.
#[derive(Args)]
struct GatewayArgs {
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    model_url: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl GatewayArgs {
    fn into_config(self) -> GatewayConfig {
        let mut config = GatewayConfig::from_env();
        if let Some(api_key) = self.api_key {
            config = config.with_api_key(api_key);
        }
        if let Some(model_url) = self.model_url {
            config = config.with_model_url(model_url);
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, env = "SQLFLOW_BIND", default_value = "0.0.0.0:8080")]
        bind: String,
        #[command(flatten)]
        gateway: GatewayArgs,
    },
    /// Translate a natural-language request and print SQL, steps and flowchart.
    Generate {
        /// What the query should do, in plain words.
        text: String,
        /// File with database structure information to include in the prompt.
        #[arg(long)]
        schema: Option<PathBuf>,
        #[command(flatten)]
        gateway: GatewayArgs,
    },
    /// Build flowchart JSON from a steps JSON file.
    Steps {
        /// Path to a JSON array of steps.
        path: PathBuf,
    },
    /// Validate a flowchart JSON file.
    Validate {
        /// Path to the flowchart JSON file.
        path: PathBuf,
    },
}

fn editor(gateway: GatewayArgs) -> Result<FlowEditor> {
    let config = gateway.into_config();
    if config.api_key.is_none() {
        warn!("no API key configured (set QWEN_API_KEY); translations will fall back to placeholders");
    }
    let gateway = QwenGateway::new(config).context("failed to build translation gateway")?;
    Ok(FlowEditor::new(Arc::new(gateway), EditorConfig::default()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, gateway } => {
            info!("Starting API server on {bind}");
            let state = api::AppState::new(editor(gateway)?);
            api::serve(&bind, state).await.context("API server failed")?;
        }
        Command::Generate { text, schema, gateway } => {
            let schema = schema
                .map(|path| {
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("cannot read schema file {}", path.display()))
                })
                .transpose()?;

            let generated = editor(gateway)?
                .generate(&text, schema.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
        Command::Steps { path } => {
            let steps: Vec<Step> = read_json(&path)?;
            let mut chart = FlowChart::new();
            chart.from_steps(&steps);
            println!("{}", chart.to_json()?);
        }
        Command::Validate { path } => {
            let snapshot: FlowChartSnapshot = read_json(&path)?;

            match validate_flowchart(&snapshot) {
                Ok(report) => {
                    println!(
                        "✅ Flowchart is valid: {} nodes, {} connections.",
                        report.node_count, report.connection_count
                    );
                    if !report.sentinels_in_place {
                        println!("⚠️  Flowchart does not run from a start node to an end node.");
                    }
                    if !report.unconnected.is_empty() {
                        println!("⚠️  Unconnected nodes: {:?}", report.unconnected);
                    }
                }
                Err(e) => {
                    eprintln!("❌ Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
