use thiserror::Error;

use crate::kind::MessageKind;

pub type Result<T, E = TeleopError> = std::result::Result<T, E>;

/// Failures local to decoding a single frame. Never fatal to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated {kind} frame: expected at least {expected} bytes, got {actual}")]
    TruncatedFrame {
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },
    #[error("type mismatch: expected {expected}, got tag 0x{found:02x}")]
    TypeMismatch { expected: MessageKind, found: u8 },
}

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum TeleopError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("actuation error: {0}")]
    Actuation(String),
    #[error("command handler error: {0}")]
    Handler(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
