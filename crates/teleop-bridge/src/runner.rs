use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use teleop_actuator::{ActuationSink, ActuatorMetrics};
use teleop_network::{Connection, FrameSender, Inbound};
use teleop_ops::log_snapshot;
use teleop_protocol::ClockSyncRequest;
use teleop_types::{
    config::TeleopConfig,
    telemetry::{ClockSyncSnapshot, StatsSnapshot},
    time::now_ms,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::{CommandHandler, ConsumerBridge};

/// Floor applied to timer periods so a zero setting cannot spin or panic.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub sync_interval: Duration,
    pub report_interval: Duration,
    pub clock_samples: usize,
    pub stats_window: usize,
}

impl BridgeSettings {
    pub fn from_config(config: &TeleopConfig) -> Self {
        Self {
            sync_interval: Duration::from_secs(config.sync.interval_secs),
            report_interval: Duration::from_secs(config.stats.report_interval_secs),
            clock_samples: config.sync.samples,
            stats_window: config.stats.window,
        }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self::from_config(&TeleopConfig::default())
    }
}

/// Final state of a bridge run.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeReport {
    pub stats: StatsSnapshot,
    pub clock: ClockSyncSnapshot,
    #[serde(skip)]
    pub actuator: ActuatorMetrics,
}

/// Periodic clock-sync requester: one request immediately, then one per
/// `interval` until `cancel` fires or the connection is gone.
pub fn spawn_sync_timer(
    sender: FrameSender,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let interval = interval.max(MIN_INTERVAL);
    tokio::spawn(async move {
        loop {
            let request = ClockSyncRequest::new(now_ms());
            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = sender.send(request.encode()) => {
                    if let Err(err) = sent {
                        error!("Sync send error: {err}");
                        break;
                    }
                }
            }
            trace!(t1 = request.t1, "Clock sync request sent");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        debug!("Sync timer stopped");
    })
}

impl<S, H> ConsumerBridge<S, H>
where
    S: ActuationSink,
    H: CommandHandler,
{
    /// Drive the connection until the peer goes away or `cancel` fires.
    ///
    /// Runs the receive-and-respond loop on the calling task alongside a
    /// spawned sync timer; both stop on the shared token, which this method
    /// cancels on exit.
    pub async fn run(&mut self, connection: Connection, cancel: CancellationToken) -> BridgeReport {
        let Connection {
            sender,
            mut inbound,
        } = connection;
        let timer = spawn_sync_timer(sender.clone(), self.settings.sync_interval, cancel.clone());

        let mut report = tokio::time::interval(self.settings.report_interval.max(MIN_INTERVAL));
        report.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                message = inbound.next() => match message {
                    Some(Inbound::Binary(frame)) => {
                        let rx_ms = now_ms();
                        if let Some(ack) = self.handle_binary(&frame, rx_ms).await {
                            tokio::select! {
                                _ = cancel.cancelled() => {
                                    info!("Shutdown requested");
                                    break;
                                }
                                sent = sender.send(ack) => match sent {
                                    Ok(()) => self.ack_sent(),
                                    Err(err) => error!("Send ack error: {err}"),
                                },
                            }
                        }
                    }
                    Some(Inbound::Text(text)) => trace!("Ignoring text message: {text}"),
                    None => {
                        info!("Connection closed by peer");
                        break;
                    }
                },
                _ = report.tick() => {
                    info!(
                        "Stats: {} offset={:.1}ms synced={}",
                        self.stats,
                        self.clock.current_offset_ms(),
                        self.clock.is_synced()
                    );
                }
            }
        }

        cancel.cancel();
        if let Err(err) = timer.await {
            error!("Sync timer task failed: {err}");
        }

        let final_report = BridgeReport {
            stats: self.stats.snapshot(),
            clock: self.clock.snapshot(),
            actuator: self.sink.metrics(),
        };
        log_snapshot(&final_report.stats);
        final_report
    }
}
