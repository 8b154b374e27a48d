use serde::{Deserialize, Serialize};

/// Per-hop timestamps carried alongside a command and its acknowledgment.
///
/// Timestamps are milliseconds since the Unix epoch, durations are
/// microseconds. A zero field has not been stamped yet; use [`stamp`] or
/// [`TimestampSet::elapsed_ms`] rather than comparing raw values.
///
/// Values are extended hop by hop through the `with_*` constructors, each of
/// which returns a new set and leaves earlier fields untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampSet {
    pub t1_origin_send: u64,
    pub t2_hop_rx: u64,
    pub t3_hop_tx: u64,
    pub t4_hop_ack_rx: u64,
    pub t5_hop_ack_tx: u64,
    pub t3_consumer_rx: u64,
    pub t4_consumer_ack: u64,
    pub decode_us: u32,
    pub process_us: u32,
    pub encode_us: u32,
}

/// Interpret a raw wire timestamp, treating zero as unset.
pub fn stamp(raw: u64) -> Option<u64> {
    (raw != 0).then_some(raw)
}

impl TimestampSet {
    pub fn origin(t1_origin_send: u64) -> Self {
        Self {
            t1_origin_send,
            ..Self::default()
        }
    }

    pub fn with_hop_forward(self, t2_hop_rx: u64, t3_hop_tx: u64) -> Self {
        Self {
            t2_hop_rx,
            t3_hop_tx,
            ..self
        }
    }

    pub fn with_hop_ack(self, t4_hop_ack_rx: u64, t5_hop_ack_tx: u64) -> Self {
        Self {
            t4_hop_ack_rx,
            t5_hop_ack_tx,
            ..self
        }
    }

    pub fn with_consumer_rx(self, t3_consumer_rx: u64, decode_us: u32) -> Self {
        Self {
            t3_consumer_rx,
            decode_us,
            ..self
        }
    }

    pub fn with_process(self, process_us: u32) -> Self {
        Self { process_us, ..self }
    }

    pub fn with_consumer_ack(self, t4_consumer_ack: u64, encode_us: u32) -> Self {
        Self {
            t4_consumer_ack,
            encode_us,
            ..self
        }
    }

    /// Signed delta `to - from` in milliseconds, only when both ends are stamped.
    /// Deltas beyond the `i64` range saturate.
    pub fn elapsed_ms(from: u64, to: u64) -> Option<i64> {
        let from = stamp(from)?;
        let to = stamp(to)?;
        let delta = to as i128 - from as i128;
        Some(delta.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Origin send to consumer receive. May be negative under clock skew.
    pub fn consumer_latency_ms(&self) -> Option<i64> {
        Self::elapsed_ms(self.t1_origin_send, self.t3_consumer_rx)
    }

    /// Time the frame spent inside the forwarding hop.
    pub fn hop_forward_ms(&self) -> Option<i64> {
        Self::elapsed_ms(self.t2_hop_rx, self.t3_hop_tx)
    }

    pub fn has_hop_forward(&self) -> bool {
        stamp(self.t2_hop_rx).is_some() && stamp(self.t3_hop_tx).is_some()
    }

    pub fn has_hop_ack(&self) -> bool {
        stamp(self.t5_hop_ack_tx).is_some()
    }
}
