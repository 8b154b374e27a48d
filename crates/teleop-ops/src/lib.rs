//! Operational helpers: logging setup and rolling latency statistics.

mod stats;

pub use stats::{LatencyStats, DEFAULT_STATS_WINDOW};

use teleop_types::{config::OpsConfig, telemetry::StatsSnapshot, Result, TeleopError};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| TeleopError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| TeleopError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

/// Emit a stats snapshot as a single structured log line.
pub fn log_snapshot(snapshot: &StatsSnapshot) {
    match serde_json::to_string(snapshot) {
        Ok(json) => info!(target: "teleop::stats", "{json}"),
        Err(err) => info!(target: "teleop::stats", "stats snapshot unavailable: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_falls_back_to_info() {
        let config = OpsConfig {
            log_level: "not a [valid directive".into(),
        };
        // A global subscriber may already be installed by another test; only a
        // filter failure would be a bug here.
        match init_tracing(&config) {
            Ok(()) => {}
            Err(TeleopError::Ops(message)) => assert!(message.contains("tracing init error")),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
