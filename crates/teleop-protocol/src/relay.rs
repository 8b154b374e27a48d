//! Hop-side frame rewriting.
//!
//! A hop never re-encodes: it copies the base bytes it received and appends
//! its own stamps to the tail, so fields it does not understand survive.

use teleop_types::{DecodeError, MessageKind};

use crate::{ack::ACK_RESERVED_OFFSET, wire::check, ClockSyncRequest, ClockSyncResponse};

fn extension_size(kind: MessageKind) -> usize {
    kind.extended_size().unwrap_or(kind.base_size())
}

/// Forward a command with the hop's receive and transmit stamps appended (81 bytes).
pub fn extend_command(frame: &[u8], t2_hop_rx: u64, t3_hop_tx: u64) -> Result<Vec<u8>, DecodeError> {
    let kind = MessageKind::Command;
    check(frame, kind)?;
    let mut extended = Vec::with_capacity(extension_size(kind));
    extended.extend_from_slice(&frame[..kind.base_size()]);
    extended.extend_from_slice(&t2_hop_rx.to_le_bytes());
    extended.extend_from_slice(&t3_hop_tx.to_le_bytes());
    Ok(extended)
}

/// Forward an ack with `t4_hop_ack_rx` in the reserved slot and `t5_hop_ack_tx` appended (77 bytes).
pub fn extend_ack(frame: &[u8], t4_hop_ack_rx: u64, t5_hop_ack_tx: u64) -> Result<Vec<u8>, DecodeError> {
    let kind = MessageKind::CommandAck;
    check(frame, kind)?;
    let mut extended = Vec::with_capacity(extension_size(kind));
    extended.extend_from_slice(&frame[..kind.base_size()]);
    extended[ACK_RESERVED_OFFSET..ACK_RESERVED_OFFSET + 8]
        .copy_from_slice(&t4_hop_ack_rx.to_le_bytes());
    extended.extend_from_slice(&t5_hop_ack_tx.to_le_bytes());
    Ok(extended)
}

/// Answer a raw clock-sync request frame with this side's receive and send stamps.
pub fn answer_clock_sync(request: &[u8], t2: u64, t3: u64) -> Result<Vec<u8>, DecodeError> {
    let request = ClockSyncRequest::decode(request)?;
    Ok(ClockSyncResponse::answer(&request, t2, t3).encode())
}
