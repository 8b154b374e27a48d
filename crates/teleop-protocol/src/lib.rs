//! Binary wire codec for velocity commands, acknowledgments and clock sync.
//!
//! Every frame starts with a [`MessageKind`] tag byte and is little-endian,
//! fixed-layout and unpadded:
//!
//! | Kind | Base | Extended |
//! |---|---|---|
//! | `Command` (0x01) | 65 | 81, `+ t2_hop_rx + t3_hop_tx` |
//! | `CommandAck` (0x02) | 69 | 77, `+ t5_hop_ack_tx` |
//! | `ClockSyncRequest` (0x03) | 9 | |
//! | `ClockSyncResponse` (0x04) | 25 | |
//!
//! A hop extends a frame only by appending to its tail. Receivers tell the
//! tiers apart purely by total length, so any length between the base and the
//! extended size decodes as the base layout.

pub mod ack;
pub mod command;
pub mod frame;
pub mod relay;
pub mod sync;

mod wire;

pub use ack::CommandAck;
pub use command::{Command, Vector3};
pub use frame::Frame;
pub use relay::{answer_clock_sync, extend_ack, extend_command};
pub use sync::{ClockSyncRequest, ClockSyncResponse};
pub use teleop_types::{DecodeError, MessageKind, TimestampSet};
