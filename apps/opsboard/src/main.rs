//! # Opsboard
//!
//! Headless host for the dashboard sync engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Opsboard Host                                  │
//! │                                                                         │
//! │  stdin ───► command ───► RefreshScheduler ───► SyncController           │
//! │                                                       │                 │
//! │                                                       ▼                 │
//! │                                     ConsoleEmitter (stdout + tracing)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```text
//! opsboard [CONFIG_PATH] [--json]
//! ```
//!
//! Commands read from stdin, one per line:
//!
//! | Command            | Effect                                  |
//! |--------------------|-----------------------------------------|
//! | `r`, `refresh`     | Manual refresh                          |
//! | `F5`, `ctrl+r`     | Keyboard-shortcut refresh               |
//! | `hide`, `show`     | Simulate dashboard visibility changes   |
//! | `auto on`, `auto off` | Toggle auto-refresh                  |
//! | `status`           | Print connection and timer status       |
//! | `q`, `quit`        | Exit                                    |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use opsboard_core::{ConnectionStatus, MetricsSnapshot};
use opsboard_sync::{
    is_refresh_shortcut, DashboardConfig, DashboardEventEmitter, RefreshScheduler, RefreshTrigger,
    SyncController, Visibility,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut config_path = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            path => config_path = Some(PathBuf::from(path)),
        }
    }

    let config = DashboardConfig::load(config_path).context("Invalid dashboard configuration")?;
    info!(
        site = %config.site.path,
        list_api = %config.provider.list_api,
        interval_ms = config.refresh.refresh_interval_ms,
        "Configuration loaded"
    );

    let interval = config.refresh.refresh_interval();
    let emitter = Arc::new(ConsoleEmitter { json });
    let controller = match SyncController::with_emitter(config, emitter) {
        Ok(controller) => Arc::new(controller),
        Err(e) if e.is_config_error() => {
            error!(error = %e, "Fix the configuration file or environment and restart");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    let scheduler = RefreshScheduler::new(controller.clone(), interval);

    scheduler.launch().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        error!(?e, "Failed to read command");
                        break;
                    }
                };
                if !handle_command(line.trim(), &scheduler, &controller).await {
                    break;
                }
            }
            _ = shutdown_signal() => break,
        }
    }

    scheduler.shutdown().await;
    info!("Opsboard stopped");
    Ok(())
}

/// Applies one stdin command. Returns false when the host should exit.
async fn handle_command(
    command: &str,
    scheduler: &RefreshScheduler<SyncController>,
    controller: &SyncController,
) -> bool {
    let (key, ctrl) = match command.to_lowercase().strip_prefix("ctrl+") {
        Some(rest) => (rest.to_string(), true),
        None => (command.to_string(), false),
    };

    if is_refresh_shortcut(&key, ctrl) {
        scheduler.trigger(RefreshTrigger::Keyboard).await;
        return true;
    }

    match command {
        "" => {}
        "r" | "refresh" => {
            scheduler.trigger(RefreshTrigger::Manual).await;
        }
        "hide" => scheduler.set_visibility(Visibility::Hidden).await,
        "show" => scheduler.set_visibility(Visibility::Visible).await,
        "auto on" => scheduler.set_auto_refresh(true).await,
        "auto off" => scheduler.set_auto_refresh(false).await,
        "status" => {
            print_status(&controller.status());
            let auto = if scheduler.auto_refresh().await { "on" } else { "off" };
            let timer = if scheduler.is_armed().await { "armed" } else { "paused" };
            println!("  auto-refresh: {} (timer {})", auto, timer);
        }
        "q" | "quit" | "exit" => return false,
        other => warn!(command = %other, "Unknown command"),
    }
    true
}

// =============================================================================
// Console Emitter
// =============================================================================

struct ConsoleEmitter {
    json: bool,
}

impl DashboardEventEmitter for ConsoleEmitter {
    fn emit_status(&self, status: &ConnectionStatus) {
        info!(state = %status.state, source = %status.source, "{}", status.message);
        if let Some(detail) = &status.last_error {
            warn!(error = %detail, "Last cycle failed");
        }
    }

    fn emit_snapshot(&self, snapshot: &MetricsSnapshot) {
        if self.json {
            match serde_json::to_string_pretty(snapshot) {
                Ok(text) => println!("{}", text),
                Err(e) => error!(?e, "Failed to serialize snapshot"),
            }
            return;
        }
        print_snapshot(snapshot);
    }
}

fn print_snapshot(snapshot: &MetricsSnapshot) {
    println!();
    println!("== Opsboard ({}) @ {} ==", snapshot.source, snapshot.computed_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Overdue tickets : {}", snapshot.overdue_tickets);
    println!("  New joiners     : {}", snapshot.new_joiners);
    println!("  Renewals due    : {} ({})", snapshot.renewals_due, snapshot.next_renewal_label());
    println!("  Asset alerts    : {}", snapshot.asset_alerts);
    println!("  Totals          : {} tickets, {} assets", snapshot.total_tickets, snapshot.total_assets);
    println!("  Recent tickets:");
    for ticket in &snapshot.recent_tickets {
        println!(
            "    [{:<11}] {} ({}, {})",
            ticket.status,
            ticket.title,
            ticket.category,
            ticket.assignee
        );
    }
}

fn print_status(status: &ConnectionStatus) {
    println!("{} [{} / {}]", status.message, status.state, status.source);
    if let Some(at) = status.last_cycle_at {
        println!("  last cycle: {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(detail) = &status.last_error {
        println!("  last error: {}", detail);
    }
}

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,opsboard=debug,opsboard_sync=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
