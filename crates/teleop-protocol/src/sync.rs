use serde::{Deserialize, Serialize};
use teleop_types::{DecodeError, MessageKind};

use crate::wire::{check, Reader, Writer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSyncRequest {
    /// Requester's send time (ms).
    pub t1: u64,
}

impl ClockSyncRequest {
    pub fn new(t1: u64) -> Self {
        Self { t1 }
    }

    pub fn encode(&self) -> Vec<u8> {
        Writer::new(MessageKind::ClockSyncRequest)
            .u64(self.t1)
            .finish()
    }

    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        check(frame, MessageKind::ClockSyncRequest)?;
        Ok(Self {
            t1: Reader::after_tag(frame).u64(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSyncResponse {
    /// Echoed from the request.
    pub t1: u64,
    /// Responder's receive time.
    pub t2: u64,
    /// Responder's send time.
    pub t3: u64,
}

impl ClockSyncResponse {
    pub fn new(t1: u64, t2: u64, t3: u64) -> Self {
        Self { t1, t2, t3 }
    }

    /// Response to `request`, received at `t2` and sent at `t3` on the responder's clock.
    pub fn answer(request: &ClockSyncRequest, t2: u64, t3: u64) -> Self {
        Self::new(request.t1, t2, t3)
    }

    pub fn encode(&self) -> Vec<u8> {
        Writer::new(MessageKind::ClockSyncResponse)
            .u64(self.t1)
            .u64(self.t2)
            .u64(self.t3)
            .finish()
    }

    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        check(frame, MessageKind::ClockSyncResponse)?;
        let mut reader = Reader::after_tag(frame);
        Ok(Self {
            t1: reader.u64(),
            t2: reader.u64(),
            t3: reader.u64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout() {
        let frame = ClockSyncRequest::new(1_700_000_000_000).encode();
        assert_eq!(frame.len(), 9);
        assert_eq!(frame[0], 0x03);
        assert_eq!(
            ClockSyncRequest::decode(&frame),
            Ok(ClockSyncRequest::new(1_700_000_000_000))
        );
    }

    #[test]
    fn response_layout() {
        let response = ClockSyncResponse::answer(&ClockSyncRequest::new(1_000), 1_005, 1_006);
        let frame = response.encode();
        assert_eq!(frame.len(), 25);
        assert_eq!(frame[0], 0x04);
        assert_eq!(&frame[17..25], &1_006u64.to_le_bytes());
        assert_eq!(ClockSyncResponse::decode(&frame), Ok(response));
    }

    #[test]
    fn rejects_short_frames() {
        let request = ClockSyncRequest::new(1).encode();
        assert!(matches!(
            ClockSyncRequest::decode(&request[..8]),
            Err(DecodeError::TruncatedFrame { expected: 9, actual: 8, .. })
        ));
        let response = ClockSyncResponse::new(1, 2, 3).encode();
        assert!(matches!(
            ClockSyncResponse::decode(&response[..24]),
            Err(DecodeError::TruncatedFrame { expected: 25, actual: 24, .. })
        ));
    }

    #[test]
    fn rejects_swapped_kinds() {
        let mut padded = ClockSyncRequest::new(1).encode();
        padded.resize(25, 0);
        assert_eq!(
            ClockSyncResponse::decode(&padded),
            Err(DecodeError::TypeMismatch {
                expected: MessageKind::ClockSyncResponse,
                found: 0x03,
            })
        );
        let response = ClockSyncResponse::new(1, 2, 3).encode();
        assert_eq!(
            ClockSyncRequest::decode(&response),
            Err(DecodeError::TypeMismatch {
                expected: MessageKind::ClockSyncRequest,
                found: 0x04,
            })
        );
    }
}
