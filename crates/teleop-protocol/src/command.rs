use std::fmt;

use serde::{Deserialize, Serialize};
use teleop_types::{DecodeError, MessageKind, TimestampSet};

use crate::wire::{check, is_extended, Reader, Writer};

/// Offset of the hop extension within a command frame.
pub const COMMAND_EXTENSION_OFFSET: usize = 65;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Velocity command (twist) tagged with its latency timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Caller-assigned; must be unique among in-flight commands for ack correlation.
    pub message_id: u64,
    pub linear: Vector3,
    pub angular: Vector3,
    pub timestamps: TimestampSet,
}

impl Command {
    pub fn new(message_id: u64, linear: Vector3, angular: Vector3, t1_origin_send: u64) -> Self {
        Self {
            message_id,
            linear,
            angular,
            timestamps: TimestampSet::origin(t1_origin_send),
        }
    }

    /// Base 65-byte layout. Hop fields are never written by the origin.
    pub fn encode(&self) -> Vec<u8> {
        Writer::new(MessageKind::Command)
            .u64(self.message_id)
            .u64(self.timestamps.t1_origin_send)
            .f64(self.linear.x)
            .f64(self.linear.y)
            .f64(self.linear.z)
            .f64(self.angular.x)
            .f64(self.angular.y)
            .f64(self.angular.z)
            .finish()
    }

    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        check(frame, MessageKind::Command)?;
        let mut reader = Reader::after_tag(frame);
        let message_id = reader.u64();
        let t1_origin_send = reader.u64();
        let linear = Vector3::new(reader.f64(), reader.f64(), reader.f64());
        let angular = Vector3::new(reader.f64(), reader.f64(), reader.f64());

        let mut timestamps = TimestampSet::origin(t1_origin_send);
        if is_extended(frame, MessageKind::Command) {
            let mut ext = Reader::at(frame, COMMAND_EXTENSION_OFFSET);
            timestamps = timestamps.with_hop_forward(ext.u64(), ext.u64());
        }

        Ok(Self {
            message_id,
            linear,
            angular,
            timestamps,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Command#{}[lin:({:.2},{:.2},{:.2}) ang:({:.2},{:.2},{:.2})]",
            self.message_id,
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z
        )
    }
}
