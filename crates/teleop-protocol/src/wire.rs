use teleop_types::{DecodeError, MessageKind};

/// Check length then tag, in that order.
pub(crate) fn check(frame: &[u8], kind: MessageKind) -> Result<(), DecodeError> {
    let expected = kind.base_size();
    if frame.len() < expected {
        return Err(DecodeError::TruncatedFrame {
            kind,
            expected,
            actual: frame.len(),
        });
    }
    let found = frame[0];
    if found != kind.tag() {
        return Err(DecodeError::TypeMismatch {
            expected: kind,
            found,
        });
    }
    Ok(())
}

/// True when the frame carries the hop-appended extension tier.
pub(crate) fn is_extended(frame: &[u8], kind: MessageKind) -> bool {
    kind.extended_size()
        .is_some_and(|extended| frame.len() >= extended)
}

/// Cursor over a frame already validated by [`check`].
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Starts just past the tag byte.
    pub(crate) fn after_tag(buf: &'a [u8]) -> Self {
        Self { buf, pos: 1 }
    }

    pub(crate) fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub(crate) fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    pub(crate) fn f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take())
    }
}

/// Appends little-endian fields to a preallocated buffer.
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn new(kind: MessageKind) -> Self {
        let mut buf = Vec::with_capacity(kind.base_size());
        buf.push(kind.tag());
        Self { buf }
    }

    pub(crate) fn u64(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn f64(mut self, value: f64) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_checked_before_tag() {
        let frame = [0x02u8; 8];
        assert_eq!(
            check(&frame, MessageKind::ClockSyncRequest),
            Err(DecodeError::TruncatedFrame {
                kind: MessageKind::ClockSyncRequest,
                expected: 9,
                actual: 8,
            })
        );
    }

    #[test]
    fn empty_frame_is_truncated() {
        assert!(matches!(
            check(&[], MessageKind::Command),
            Err(DecodeError::TruncatedFrame { actual: 0, .. })
        ));
    }

    #[test]
    fn writer_and_reader_agree_on_layout() {
        let buf = Writer::new(MessageKind::ClockSyncResponse)
            .u64(7)
            .u32(9)
            .f64(-1.25)
            .finish();
        assert_eq!(buf.len(), 1 + 8 + 4 + 8);
        assert_eq!(buf[0], 0x04);
        let mut reader = Reader::after_tag(&buf);
        assert_eq!(reader.u64(), 7);
        assert_eq!(reader.u32(), 9);
        assert_eq!(reader.f64(), -1.25);
    }
}
