use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use teleop_actuator::sink_from_config;
use teleop_bridge::{BridgeSettings, ConsumerBridge, NoopHandler};
use teleop_network::{Transport, WebSocketTransport};
use teleop_ops::init_tracing;
use teleop_types::config::TeleopConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Receives binary twist commands and acknowledges them with latency stamps.
#[derive(Debug, Parser)]
#[command(name = "teleop-consumer", version)]
struct Args {
    /// Relay WebSocket URL
    #[arg(short, long)]
    url: Option<String>,
    /// Topic to publish decoded twists on (disabled when omitted)
    #[arg(short, long)]
    topic: Option<String>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
    /// TOML config file; defaults to $TELEOP_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.clone());
    apply_overrides(&mut config, &args);
    init_tracing(&config.ops)?;

    info!("URL:   {}", config.transport.url);
    info!(
        "Topic: {}",
        config.actuation.topic.as_deref().unwrap_or("disabled")
    );

    let cancel = CancellationToken::new();
    let transport = WebSocketTransport::new(config.transport.clone());
    let connection = transport
        .connect(cancel.clone())
        .await
        .context("connection failed")?;
    info!("Connected. Waiting for commands...");

    let mut bridge = ConsumerBridge::new(
        BridgeSettings::from_config(&config),
        sink_from_config(&config.actuation),
        NoopHandler,
    );
    bridge.start().await;

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.cancel();
    });

    let report = bridge.run(connection, cancel).await;
    info!("Closing...");
    bridge.shutdown().await;
    info!(
        "Final: rx={} acks={} lat={:.1}ms offset={:.1}ms rtt={}ms synced={}",
        report.stats.received_count,
        report.stats.acknowledged_count,
        report.stats.avg_latency_ms,
        report.clock.offset_ms,
        report.clock.rtt_ms,
        report.clock.synced
    );
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Interrupt received"),
                    _ = terminate.recv() => info!("Terminate received"),
                }
                return;
            }
            Err(err) => warn!("Unable to listen for SIGTERM: {err}"),
        }
    }
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupt received"),
        Err(err) => {
            warn!("Unable to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    }
}

fn load_config(from_args: Option<PathBuf>) -> TeleopConfig {
    let from_env = env::var("TELEOP_CONFIG").ok().map(PathBuf::from);
    let Some(path) = from_args.or(from_env) else {
        return TeleopConfig::default();
    };
    match TeleopConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path.display()
                );
                TeleopConfig::default()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path.display()
            );
            TeleopConfig::default()
        }
    }
}

fn apply_overrides(config: &mut TeleopConfig, args: &Args) {
    if let Some(url) = &args.url {
        config.transport.url = url.clone();
    }
    if let Some(topic) = &args.topic {
        config.actuation.topic = Some(topic.clone());
    }
    if args.verbose {
        config.ops.log_level = "debug".into();
    }
}
