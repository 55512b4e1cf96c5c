//! well-topology - barrier topology for a single well snapshot
//!
//! # Usage
//!
//! ```bash
//! # Build the full topology result for a snapshot (JSON on stdout)
//! well-topology build --snapshot well.json --well-id W-1 --pretty
//!
//! # Edge rows highlighted by one inspector scope
//! well-topology inspect --snapshot well.json --well-id W-1 --scope spof
//! well-topology inspect --snapshot well.json --well-id W-1 \
//!     --scope selected_barrier --element barrier:pkr-1:annular_seal
//!
//! # Check a config file for typos and invalid values
//! well-topology check-config --path topology_config.toml
//! ```
//!
//! # Environment Variables
//!
//! - `WELL_TOPOLOGY_CONFIG`: Path to a topology config TOML file
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use well_topology::config::{self, TopologyConfig, validation};
use well_topology::topology::inspector::{EdgeRow, NodeRow};
use well_topology::{
    BuildRequest, InspectorScope, ResultSynchronizer, SyncOutcome, TopologyInspector,
    TopologyResult, WellSnapshot, WorkerClient, build_topology_model,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "well-topology")]
#[command(about = "Well barrier topology: flow paths, minimum failure and barrier envelopes")]
#[command(version)]
struct CliArgs {
    /// Topology config file (overrides WELL_TOPOLOGY_CONFIG and ./topology_config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Build the topology result for a snapshot and print it as JSON
    Build {
        /// Snapshot JSON file
        #[arg(long)]
        snapshot: PathBuf,
        /// Well identifier carried into the result
        #[arg(long, env = "WELL_ID")]
        well_id: String,
        /// Build in-process with this request id instead of through the worker
        #[arg(long)]
        request_id: Option<u64>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
        /// Print only the summary line
        #[arg(long)]
        summary: bool,
    },

    /// Print node and edge rows highlighted by an inspector scope
    Inspect {
        /// Snapshot JSON file
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long, env = "WELL_ID")]
        well_id: String,
        /// all | min_path | spof | active_flow | selected_barrier
        #[arg(long, default_value = "all")]
        scope: String,
        /// Barrier element id for the selected_barrier scope
        #[arg(long)]
        element: Option<String>,
        /// Include rows outside the scope
        #[arg(long)]
        all_rows: bool,
    },

    /// Validate a topology config file
    CheckConfig {
        /// Config file (default: the standard search order)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

// ============================================================================
// Helpers
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<TopologyConfig> {
    match path {
        Some(p) => TopologyConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(TopologyConfig::load()),
    }
}

fn read_snapshot(path: &Path) -> Result<WellSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn log_warnings(result: &TopologyResult) {
    for w in &result.validation_warnings {
        warn!(code = %w.code, row_id = ?w.row_id, "{}", w.message);
    }
}

/// Build through the worker, applying the response the way an editor would.
async fn build_via_worker(snapshot: &WellSnapshot, well_id: &str) -> Result<TopologyResult> {
    let client = WorkerClient::spawn(config::get().clone());
    let mut sync = ResultSynchronizer::new();

    let pending = client
        .submit(snapshot, well_id)
        .await
        .context("Failed to submit topology build")?;
    sync.note_issued(pending.request_id);
    let response = pending.response().await?;

    match sync.apply(response) {
        SyncOutcome::Applied => sync
            .current()
            .cloned()
            .context("Applied response carried no result"),
        SyncOutcome::Rejected => bail!(
            "Topology build rejected: {}",
            sync.last_error().unwrap_or("unknown error")
        ),
        SyncOutcome::Stale => bail!("Topology response arrived for a superseded request"),
    }
}

fn parse_scope(scope: &str, element: Option<String>) -> Result<InspectorScope> {
    if scope == "selected_barrier" {
        let id = element.context("--element is required for the selected_barrier scope")?;
        return Ok(InspectorScope::SelectedBarrier(id));
    }
    scope.parse().map_err(anyhow::Error::msg)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectOutput {
    scope: String,
    nodes: Vec<NodeRow>,
    edges: Vec<EdgeRow>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    match args.command {
        SubCommand::Build {
            snapshot,
            well_id,
            request_id,
            pretty,
            summary,
        } => {
            config::init(load_config(args.config.as_deref())?);
            let snapshot = read_snapshot(&snapshot)?;

            let result = match request_id {
                Some(id) => {
                    let request = BuildRequest::new(id, well_id.as_str());
                    build_topology_model(&snapshot, &request, config::get())?
                }
                None => build_via_worker(&snapshot, &well_id).await?,
            };
            log_warnings(&result);

            if summary {
                print_json(&result.summary(), pretty)?;
            } else {
                print_json(&result, pretty)?;
            }
        }

        SubCommand::Inspect {
            snapshot,
            well_id,
            scope,
            element,
            all_rows,
        } => {
            config::init(load_config(args.config.as_deref())?);
            let scope = parse_scope(&scope, element)?;
            let snapshot = read_snapshot(&snapshot)?;
            let result = build_via_worker(&snapshot, &well_id).await?;

            let inspector = TopologyInspector::new(&result);
            let mut nodes = inspector.node_rows(&scope);
            let mut edges = inspector.edge_rows(&scope);
            if !all_rows {
                nodes.retain(|n| n.in_scope);
                edges.retain(|e| e.in_scope);
            }
            info!(scope = %scope, nodes = nodes.len(), edges = edges.len(), "Inspector rows");
            print_json(
                &InspectOutput {
                    scope: scope.to_string(),
                    nodes,
                    edges,
                },
                true,
            )?;
        }

        SubCommand::CheckConfig { path } => {
            let path = path.or(args.config);
            if let Some(ref p) = path {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read {}", p.display()))?;
                let warnings = validation::validate_unknown_keys(&raw);
                for w in &warnings {
                    println!("  warning: {w}");
                }
            }
            let config = load_config(path.as_deref())?;
            println!("{}", config.to_toml()?);
            println!("  config OK");
        }
    }

    Ok(())
}
