//! camrelay relay server binary.
//!
//! Resolves configuration (file, `CAMRELAY_*` environment, CLI flags), then
//! serves the camera, command and PIN endpoints over HTTP until Ctrl-C.
//! A background task evicts expired commands every command TTL.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use camrelay_core::tracing_init::{default_filter, init_tracing};
use camrelay_core::{PinPersistence, UnsetPinPolicy, config::load_config};
use camrelay_relay::commands::{COMMAND_TTL, CommandRelay};
use camrelay_relay::server::{AppState, build_router};

#[derive(Parser)]
#[command(name = "camrelay-relay", version, about = "Encrypted camera relay")]
struct Args {
    /// Config file (JSON). Defaults to ~/.config/camrelay/relay.json if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Persist the PIN to this file instead of keeping it in memory.
    #[arg(long)]
    pin_file: Option<PathBuf>,

    /// What to do when a client supplies a PIN before one is set.
    #[arg(long, value_name = "reject|allow|adopt")]
    unset_pin_policy: Option<UnsetPinPolicy>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(path) = args.pin_file {
        config.pin.persistence = PinPersistence::File;
        config.pin.path = Some(path);
    }
    if let Some(policy) = args.unset_pin_policy {
        config.pin.unset_policy = policy;
    }
    config.server.log_json |= args.log_json;
    config.validate()?;

    init_tracing(
        &default_filter("camrelay_relay", &config.server.log_level),
        config.server.log_json,
    );

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        unset_pin_policy = ?config.pin.unset_policy,
        "Starting camrelay-relay"
    );

    let state = AppState::from_config(&config)?;
    if !state.pins.is_durable() {
        info!("PIN kept in memory only; it will not survive a restart");
    }

    spawn_command_sweeper(Arc::clone(&state.commands));

    let app = build_router(state, config.server.max_payload_bytes);
    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    info!(addr = %listener.local_addr()?, "Relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay stopped");
    Ok(())
}

/// Evict expired commands even when nobody polls.
fn spawn_command_sweeper(commands: Arc<CommandRelay>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(COMMAND_TTL);
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            let evicted = commands.evict_expired().await;
            if evicted > 0 {
                info!(evicted, "Background command sweep completed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
