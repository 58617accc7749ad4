//! fleetwatch - equipment monitoring playback engine
//!
//! Serves the session snapshot and operator controls over HTTP while the
//! simulation clock and fleet refresh run in the background.
//!
//! # Usage
//!
//! ```bash
//! # Machine tools against a local scorer
//! cargo run --release
//!
//! # Turbines, two units selected at startup
//! ./fleetwatch --domain turbine --select 3,7
//! ```
//!
//! # Environment Variables
//!
//! - `FLEETWATCH_CONFIG`: Path to the TOML config file
//! - `FLEETWATCH_REMOTE_URL`: Remote scorer base URL
//! - `FLEETWATCH_SERVER_ADDR`: HTTP bind address
//! - `FLEETWATCH_CORS_ORIGINS`: Allowed dashboard origins
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use fleetwatch::api::{create_app, ApiState};
use fleetwatch::config::{self, MonitorConfig};
use fleetwatch::session::{clock, fleet_sync, MonitorSession};
use fleetwatch::{Domain, EntityId, HttpScorer};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(about = "Playback and risk-state engine for equipment monitoring dashboards")]
#[command(version)]
struct CliArgs {
    /// Equipment domain: product, turbine or generator
    #[arg(long, env = "FLEETWATCH_DOMAIN")]
    domain: Option<Domain>,

    /// Remote scorer base URL (default: "http://localhost:8000")
    #[arg(long, env = "FLEETWATCH_REMOTE_URL")]
    remote: Option<String>,

    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long, env = "FLEETWATCH_SERVER_ADDR")]
    addr: Option<String>,

    /// Entities selected at startup, comma separated
    #[arg(long, value_delimiter = ',')]
    select: Vec<EntityId>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

// ============================================================================
// Task Supervision
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    SimulationClock,
    FleetRefresh,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::SimulationClock => write!(f, "SimulationClock"),
            TaskName::FleetRefresh => write!(f, "FleetRefresh"),
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the config file and apply CLI/env overrides.
fn resolve_config(args: &CliArgs) -> Result<MonitorConfig> {
    let mut cfg = MonitorConfig::load();
    if let Some(domain) = args.domain {
        cfg.domain = domain;
    }
    if let Some(remote) = &args.remote {
        cfg.remote.base_url = remote.clone();
    }
    if let Some(addr) = &args.addr {
        cfg.server.addr = addr.clone();
    }
    cfg.validate().context("Invalid configuration")?;
    Ok(cfg)
}

fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await
            .context("HTTP server error")?;

        info!("[HttpServer] Graceful shutdown complete");
        Ok(TaskName::HttpServer)
    });
}

fn spawn_session_tasks(
    task_set: &mut JoinSet<Result<TaskName>>,
    session: &MonitorSession,
    cancel_token: &CancellationToken,
) {
    let (s, c) = (session.clone(), cancel_token.clone());
    task_set.spawn(async move {
        clock::run(s, c).await;
        Ok(TaskName::SimulationClock)
    });

    let (s, c) = (session.clone(), cancel_token.clone());
    task_set.spawn(async move {
        fleet_sync::run(s, c).await;
        Ok(TaskName::FleetRefresh)
    });
}

/// Monitor tasks; the first failure cancels everything.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {:#}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let the remaining tasks observe cancellation
    while task_set.join_next().await.is_some() {}
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let cfg = resolve_config(&args)?;
    if args.print_config {
        println!("{}", cfg.to_toml()?);
        return Ok(());
    }
    config::init(cfg);
    let cfg = config::get();

    info!(
        domain = %cfg.domain,
        remote = %cfg.remote.base_url,
        tick_ms = cfg.tick_interval().as_millis() as u64,
        "fleetwatch starting"
    );

    let scorer = HttpScorer::from_config(&cfg.remote).context("Failed to build scorer client")?;
    let session = MonitorSession::new(cfg, Arc::new(scorer));

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.addr))?;
    info!(addr = %cfg.server.addr, "API listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(
        &mut task_set,
        listener,
        create_app(ApiState::new(session.clone())),
        cancel_token.clone(),
    );
    spawn_session_tasks(&mut task_set, &session, &cancel_token);

    if !args.select.is_empty() {
        let initial = args.select.clone();
        let session = session.clone();
        tokio::spawn(async move {
            let mode = session.select(initial).await;
            info!(mode = mode.name(), "Initial selection applied");
        });
    }

    run_supervisor(&mut task_set, cancel_token).await?;

    info!("fleetwatch shutdown complete");
    Ok(())
}
