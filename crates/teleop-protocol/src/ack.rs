use serde::{Deserialize, Serialize};
use teleop_types::{DecodeError, MessageKind, TimestampSet};

use crate::wire::{check, is_extended, Reader, Writer};

/// Offset of the reserved slot that a hop fills with `t4_hop_ack_rx`.
pub const ACK_RESERVED_OFFSET: usize = 61;
/// Offset of the hop-appended `t5_hop_ack_tx`.
pub const ACK_EXTENSION_OFFSET: usize = 69;

/// Acknowledgment of a [`crate::Command`], carrying every stamp gathered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub message_id: u64,
    pub timestamps: TimestampSet,
}

impl CommandAck {
    pub fn new(message_id: u64, timestamps: TimestampSet) -> Self {
        Self {
            message_id,
            timestamps,
        }
    }

    /// Base 69-byte layout as produced by the consumer.
    pub fn encode(&self) -> Vec<u8> {
        let ts = &self.timestamps;
        Writer::new(MessageKind::CommandAck)
            .u64(self.message_id)
            .u64(ts.t1_origin_send)
            .u64(ts.t2_hop_rx)
            .u64(ts.t3_hop_tx)
            .u64(ts.t3_consumer_rx)
            .u64(ts.t4_consumer_ack)
            .u32(ts.decode_us)
            .u32(ts.process_us)
            .u32(ts.encode_us)
            .u64(ts.t4_hop_ack_rx)
            .finish()
    }

    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        check(frame, MessageKind::CommandAck)?;
        let mut reader = Reader::after_tag(frame);
        let message_id = reader.u64();
        let timestamps = TimestampSet {
            t1_origin_send: reader.u64(),
            t2_hop_rx: reader.u64(),
            t3_hop_tx: reader.u64(),
            t3_consumer_rx: reader.u64(),
            t4_consumer_ack: reader.u64(),
            decode_us: reader.u32(),
            process_us: reader.u32(),
            encode_us: reader.u32(),
            t4_hop_ack_rx: reader.u64(),
            t5_hop_ack_tx: if is_extended(frame, MessageKind::CommandAck) {
                Reader::at(frame, ACK_EXTENSION_OFFSET).u64()
            } else {
                0
            },
        };
        Ok(Self {
            message_id,
            timestamps,
        })
    }
}
