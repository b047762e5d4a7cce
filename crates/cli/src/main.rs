//! `halo` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: start the API server.
//! - `migrate`: run pending database migrations.
//! - `inspect`: report on the graph in an export file or AI response.
//! - `generate`: turn an AI response into a canvas.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use graph::catalog::resolve_icons;
use graph::transfer::read_import;
use graph::{from_steps, inspect, parse_ai_response, Canvas, Entropy, SeededEntropy, Step, SystemEntropy};
use serde_json::Value;
use tracing::info;

use api::{AppState, Config};
use chat::{HttpAssistant, MemoryHistoryStore};
use db::{MemoryWorkflowStore, WorkflowStore};

#[derive(Parser)]
#[command(name = "halo", about = "HALO automation workspace", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        /// Overrides HALO_HOST/HALO_PORT.
        #[arg(long)]
        bind: Option<String>,
        /// Keep workflows in memory instead of Postgres.
        #[arg(long)]
        memory: bool,
    },
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Print the graph report for an export file or an AI generation response.
    Inspect {
        path: PathBuf,
    },
    /// Materialise an AI generation response into a canvas and print it.
    Generate {
        path: PathBuf,
        /// Seed the id and position generator for reproducible output.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, memory } => serve(bind, memory).await,
        Command::Migrate { database_url } => {
            info!("running migrations");
            let pool = db::pool::create_pool(&database_url, 2)
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;
            info!("migrations applied successfully");
            Ok(())
        }
        Command::Inspect { path } => {
            let report = inspect_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Generate { path, seed } => {
            let canvas = generate_file(&path, seed)?;
            println!("{}", serde_json::to_string_pretty(&canvas)?);
            Ok(())
        }
    }
}

async fn serve(bind: Option<String>, memory: bool) -> Result<()> {
    let config = Config::default();
    let bind = bind.unwrap_or_else(|| config.server.bind_addr());

    let store: Arc<dyn WorkflowStore> = if memory {
        info!("using the in-memory workflow store");
        Arc::new(MemoryWorkflowStore::new())
    } else {
        let url = config
            .database
            .url
            .as_deref()
            .context("DATABASE_URL is not set (use --memory to run without Postgres)")?;
        let store = db::pool::connect_store(url, config.database.max_connections)
            .await
            .context("failed to connect to database")?;
        Arc::new(store)
    };

    let assistant_url = config
        .assistant
        .url
        .clone()
        .context("HALO_ASSISTANT_URL is not set")?;
    let assistant = HttpAssistant::new(assistant_url, config.assistant.api_key.clone(), config.assistant.timeout())
        .context("failed to build the assistant client")?;

    let state = AppState::new(
        store,
        Arc::new(assistant),
        Arc::new(MemoryHistoryStore::new()),
        config.chat.send_policy,
    );

    info!("starting API server on {bind}");
    api::serve(&bind, state).await?;
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Export files carry `steps`; anything else is taken as an AI response.
fn inspect_file(path: &Path) -> Result<graph::GraphReport> {
    let value = read_json(path)?;

    if value.get("steps").is_some() {
        let document = read_import(&value)?;
        let steps: Vec<Step> = serde_json::from_value(Value::Array(document.steps))
            .context("export file has malformed steps")?;
        let nodes = from_steps(&steps);
        return Ok(inspect(&nodes, &[]));
    }

    let Some(parsed) = parse_ai_response(&value, &mut SystemEntropy::new()) else {
        bail!("{} is neither an export file nor an AI response with nodes", path.display());
    };
    Ok(inspect(&parsed.nodes, &parsed.edges))
}

fn generate_file(path: &Path, seed: Option<u64>) -> Result<Canvas> {
    let value = read_json(path)?;

    let mut entropy: Box<dyn Entropy> = match seed {
        Some(seed) => Box::new(SeededEntropy::new(0, seed)),
        None => Box::new(SystemEntropy::new()),
    };

    let mut canvas = Canvas::default();
    let Some(summary) = canvas.apply_generation(&value, entropy.as_mut()) else {
        bail!("{} does not contain a workflow generation", path.display());
    };
    resolve_icons(&mut canvas.nodes);

    info!(nodes = summary.node_count, edges = summary.edge_count, "canvas generated");
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_temp(name: &str, value: &Value) -> PathBuf {
        let path = std::env::temp_dir().join(format!("halo-{}-{name}.json", std::process::id()));
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn response() -> Value {
        json!({
            "action": "create_workflow",
            "nodes": [
                { "integration": "form_submission", "name": "Form Submission", "type": "trigger" },
                { "integration": "hubspot", "name": "HubSpot", "type": "action" }
            ],
            "connections": [{ "source": "missing", "target": "also-missing" }]
        })
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let path = write_temp("seeded", &response());
        let first = generate_file(&path, Some(42)).unwrap();
        let second = generate_file(&path, Some(42)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.nodes.len(), 2);
        assert!(first.nodes[0].id.starts_with("node-0-"));
    }

    #[test]
    fn inspect_reports_dangling_edges_in_a_response() {
        let path = write_temp("dangling", &response());
        let report = inspect_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.dangling_edges.len(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn inspect_reads_export_files() {
        let export = json!({
            "version": "1.0.0",
            "name": "Lead intake",
            "steps": [
                { "id": "s1", "type": "trigger", "name": "Webhook", "config": {},
                  "position": { "x": 100.0, "y": 100.0 }, "order": 0 }
            ]
        });
        let path = write_temp("export", &export);
        let report = inspect_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.order, vec!["s1"]);
    }

    #[test]
    fn unreadable_files_are_errors() {
        let missing = std::env::temp_dir().join("halo-no-such-file.json");
        assert!(inspect_file(&missing).is_err());

        let path = write_temp("not-a-graph", &json!({ "action": "explain" }));
        assert!(generate_file(&path, None).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
