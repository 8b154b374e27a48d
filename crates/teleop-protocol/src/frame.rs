use teleop_types::{DecodeError, MessageKind};

use crate::{ClockSyncRequest, ClockSyncResponse, Command, CommandAck};

/// Any decoded frame, dispatched on its leading tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Command(Command),
    CommandAck(CommandAck),
    ClockSyncRequest(ClockSyncRequest),
    ClockSyncResponse(ClockSyncResponse),
}

impl Frame {
    /// Returns `Ok(None)` for empty frames and unknown tags, which receivers skip.
    pub fn decode(frame: &[u8]) -> Result<Option<Self>, DecodeError> {
        let Some(kind) = MessageKind::peek(frame) else {
            return Ok(None);
        };
        let decoded = match kind {
            MessageKind::Command => Frame::Command(Command::decode(frame)?),
            MessageKind::CommandAck => Frame::CommandAck(CommandAck::decode(frame)?),
            MessageKind::ClockSyncRequest => {
                Frame::ClockSyncRequest(ClockSyncRequest::decode(frame)?)
            }
            MessageKind::ClockSyncResponse => {
                Frame::ClockSyncResponse(ClockSyncResponse::decode(frame)?)
            }
        };
        Ok(Some(decoded))
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Frame::Command(_) => MessageKind::Command,
            Frame::CommandAck(_) => MessageKind::CommandAck,
            Frame::ClockSyncRequest(_) => MessageKind::ClockSyncRequest,
            Frame::ClockSyncResponse(_) => MessageKind::ClockSyncResponse,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Command(msg) => msg.encode(),
            Frame::CommandAck(msg) => msg.encode(),
            Frame::ClockSyncRequest(msg) => msg.encode(),
            Frame::ClockSyncResponse(msg) => msg.encode(),
        }
    }
}
