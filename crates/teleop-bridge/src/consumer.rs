use std::{hint::black_box, time::Instant};

use teleop_actuator::ActuationSink;
use teleop_clock::ClockSynchronizer;
use teleop_ops::LatencyStats;
use teleop_protocol::{ClockSyncResponse, Command, CommandAck, MessageKind};
use teleop_types::time::{micros_u32, now_ms};
use tracing::{debug, error, info, trace, warn};

use crate::{runner::BridgeSettings, CommandHandler};

/// Terminal consumer of the pipeline. Owns the clock estimate and the rolling
/// stats for one connection; frames must be fed from a single task in
/// arrival order.
pub struct ConsumerBridge<S, H>
where
    S: ActuationSink,
    H: CommandHandler,
{
    pub(crate) sink: S,
    handler: H,
    pub(crate) clock: ClockSynchronizer,
    pub(crate) stats: LatencyStats,
    pub(crate) settings: BridgeSettings,
}

impl<S, H> ConsumerBridge<S, H>
where
    S: ActuationSink,
    H: CommandHandler,
{
    pub fn new(settings: BridgeSettings, sink: S, handler: H) -> Self {
        Self {
            sink,
            handler,
            clock: ClockSynchronizer::new(settings.clock_samples),
            stats: LatencyStats::new(settings.stats_window),
            settings,
        }
    }

    /// Bring up the actuation sink. A sink that fails to start is reported and
    /// left in place; commands are still acknowledged.
    pub async fn start(&mut self) {
        if let Err(err) = self.sink.init().await {
            error!("Actuation sink init failed: {err}");
        }
    }

    pub async fn shutdown(&mut self) {
        if let Err(err) = self.sink.shutdown().await {
            warn!("Actuation sink shutdown failed: {err}");
        }
    }

    pub fn clock(&self) -> &ClockSynchronizer {
        &self.clock
    }

    pub fn stats(&self) -> &LatencyStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process one binary frame received at `rx_ms` (local wall clock).
    ///
    /// Returns the encoded acknowledgment to send back for commands. Malformed
    /// frames are logged and dropped; they never end the connection.
    pub async fn handle_binary(&mut self, frame: &[u8], rx_ms: u64) -> Option<Vec<u8>> {
        match MessageKind::peek(frame) {
            Some(MessageKind::Command) => self.handle_command(frame, rx_ms).await,
            Some(MessageKind::ClockSyncResponse) => {
                self.handle_sync_response(frame, rx_ms);
                None
            }
            Some(kind) => {
                trace!("Ignoring {kind} frame at consumer");
                None
            }
            None => {
                debug!(size = frame.len(), "Ignoring frame with unknown or missing tag");
                None
            }
        }
    }

    /// Count an acknowledgment that actually left through the transport.
    pub fn ack_sent(&mut self) {
        self.stats.record_ack();
    }

    async fn handle_command(&mut self, frame: &[u8], rx_ms: u64) -> Option<Vec<u8>> {
        let decode_start = Instant::now();
        let command = match Command::decode(frame) {
            Ok(command) => command,
            Err(err) => {
                warn!(size = frame.len(), "Decode error: {err}");
                return None;
            }
        };
        let decode_us = micros_u32(decode_start.elapsed());
        let command = Command {
            timestamps: command.timestamps.with_consumer_rx(rx_ms, decode_us),
            ..command
        };

        let process_start = Instant::now();
        if let Err(err) = self.handler.on_command(&command) {
            error!(message_id = command.message_id, "Command handler error: {err}");
        }
        if let Err(err) = self.sink.publish(&command).await {
            error!(message_id = command.message_id, "Actuation error: {err}");
        }
        let process_us = micros_u32(process_start.elapsed());
        let processed = command.timestamps.with_process(process_us);

        // The ack carries its own encode time, so encode once to measure and
        // again with the measurement filled in.
        let encode_start = Instant::now();
        let acked = processed.with_consumer_ack(now_ms(), 0);
        black_box(CommandAck::new(command.message_id, acked).encode());
        let encode_us = micros_u32(encode_start.elapsed());
        let timestamps = acked.with_consumer_ack(acked.t4_consumer_ack, encode_us);
        let ack = CommandAck::new(command.message_id, timestamps).encode();

        let latency_ms = timestamps.consumer_latency_ms();
        self.stats.record(
            latency_ms.map_or(f64::NAN, |ms| ms as f64),
            decode_us,
            process_us,
            encode_us,
        );
        debug!(
            message_id = command.message_id,
            latency_ms = latency_ms.unwrap_or_default(),
            hop_forward_ms = timestamps.hop_forward_ms().unwrap_or_default(),
            "{command}"
        );
        Some(ack)
    }

    fn handle_sync_response(&mut self, frame: &[u8], t4: u64) {
        match ClockSyncResponse::decode(frame) {
            Ok(response) => {
                let outcome = self
                    .clock
                    .process(response.t1, response.t2, response.t3, t4);
                info!(
                    "Clock sync: offset={:.1}ms rtt={}ms (median rtt={}ms, synced={})",
                    outcome.median_offset_ms,
                    outcome.sample_rtt_ms,
                    self.clock.current_rtt_ms(),
                    self.clock.is_synced()
                );
            }
            Err(err) => warn!("Sync decode error: {err}"),
        }
    }
}
