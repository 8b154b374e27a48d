//! Shared domain types for the teleop latency pipeline.

pub mod config;
pub mod kind;
pub mod telemetry;
pub mod time;
pub mod timestamps;

mod errors;

pub use errors::{DecodeError, Result, TeleopError};
pub use kind::MessageKind;
pub use timestamps::TimestampSet;
