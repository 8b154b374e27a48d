//! Consumer-side driving loop: decode, stamp, actuate, acknowledge.

mod consumer;
mod runner;

pub use consumer::ConsumerBridge;
pub use runner::{spawn_sync_timer, BridgeReport, BridgeSettings};

use teleop_protocol::Command;
use teleop_types::{Result, TeleopError};

/// Callback invoked with every decoded command before it is acknowledged.
/// Errors are logged by the bridge and never suppress the acknowledgment.
pub trait CommandHandler: Send + Sync {
    fn on_command(&self, command: &Command) -> Result<()>;
}

impl<F> CommandHandler for F
where
    F: Fn(&Command) -> Result<()> + Send + Sync,
{
    fn on_command(&self, command: &Command) -> Result<()> {
        self(command)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl CommandHandler for NoopHandler {
    fn on_command(&self, _command: &Command) -> Result<()> {
        Ok(())
    }
}

pub fn handler_error(message: impl Into<String>) -> TeleopError {
    TeleopError::Handler(message.into())
}
