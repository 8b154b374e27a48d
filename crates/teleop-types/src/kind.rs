use std::fmt;

use serde::{Deserialize, Serialize};

/// Leading tag byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    Command = 0x01,
    CommandAck = 0x02,
    ClockSyncRequest = 0x03,
    ClockSyncResponse = 0x04,
}

impl MessageKind {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(MessageKind::Command),
            0x02 => Some(MessageKind::CommandAck),
            0x03 => Some(MessageKind::ClockSyncRequest),
            0x04 => Some(MessageKind::ClockSyncResponse),
            _ => None,
        }
    }

    /// Kind of a raw frame, if it has a recognised leading byte.
    pub fn peek(frame: &[u8]) -> Option<Self> {
        frame.first().copied().and_then(Self::from_tag)
    }

    /// Minimum length a frame of this kind must have.
    pub const fn base_size(self) -> usize {
        match self {
            MessageKind::Command => 65,
            MessageKind::CommandAck => 69,
            MessageKind::ClockSyncRequest => 9,
            MessageKind::ClockSyncResponse => 25,
        }
    }

    /// Length at which hop-appended fields are present, for kinds that have them.
    pub const fn extended_size(self) -> Option<usize> {
        match self {
            MessageKind::Command => Some(81),
            MessageKind::CommandAck => Some(77),
            MessageKind::ClockSyncRequest | MessageKind::ClockSyncResponse => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Command => "Command",
            MessageKind::CommandAck => "CommandAck",
            MessageKind::ClockSyncRequest => "ClockSyncRequest",
            MessageKind::ClockSyncResponse => "ClockSyncResponse",
        };
        write!(f, "{name}(0x{:02x})", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        for kind in [
            MessageKind::Command,
            MessageKind::CommandAck,
            MessageKind::ClockSyncRequest,
            MessageKind::ClockSyncResponse,
        ] {
            assert_eq!(MessageKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(MessageKind::from_tag(0x00), None);
        assert_eq!(MessageKind::from_tag(0x05), None);
    }

    #[test]
    fn peek_reads_leading_byte() {
        assert_eq!(MessageKind::peek(&[0x04, 0, 0]), Some(MessageKind::ClockSyncResponse));
        assert_eq!(MessageKind::peek(&[]), None);
        assert_eq!(MessageKind::peek(&[0xff]), None);
    }
}
