//! Actuation sinks receiving decoded velocity commands.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use teleop_protocol::Command;
use teleop_types::{config::ActuationConfig, Result, TeleopError};
use tracing::{debug, info};

/// Aggregated sink counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActuatorMetrics {
    pub published: u64,
    pub failed: u64,
    pub last_message_id: Option<u64>,
}

/// Destination for decoded twists. Failures are reported but never block the
/// acknowledgment of the command.
#[async_trait]
pub trait ActuationSink: Send + Sync {
    async fn init(&mut self) -> Result<()>;
    async fn publish(&self, command: &Command) -> Result<()>;
    async fn shutdown(&mut self) -> Result<()>;
    fn metrics(&self) -> ActuatorMetrics;
}

#[async_trait]
impl<T: ActuationSink + ?Sized> ActuationSink for Box<T> {
    async fn init(&mut self) -> Result<()> {
        (**self).init().await
    }

    async fn publish(&self, command: &Command) -> Result<()> {
        (**self).publish(command).await
    }

    async fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown().await
    }

    fn metrics(&self) -> ActuatorMetrics {
        (**self).metrics()
    }
}

/// Default sink when no actuation target is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl ActuationSink for NoopSink {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, _command: &Command) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn metrics(&self) -> ActuatorMetrics {
        ActuatorMetrics::default()
    }
}

/// Publishes twists on a named topic as log records.
pub struct TracingSink {
    topic: String,
    ready: bool,
    metrics: Arc<Mutex<ActuatorMetrics>>,
}

impl TracingSink {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ready: false,
            metrics: Arc::new(Mutex::new(ActuatorMetrics::default())),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn update_metrics(&self, apply: impl FnOnce(&mut ActuatorMetrics)) -> Result<()> {
        let mut metrics = self
            .metrics
            .lock()
            .map_err(|_| actuation_error("failed to lock metrics"))?;
        apply(&mut metrics);
        Ok(())
    }
}

#[async_trait]
impl ActuationSink for TracingSink {
    async fn init(&mut self) -> Result<()> {
        info!("Actuation publisher ready on {}", self.topic);
        self.ready = true;
        Ok(())
    }

    async fn publish(&self, command: &Command) -> Result<()> {
        if !self.ready {
            self.update_metrics(|m| m.failed += 1)?;
            return Err(actuation_error(format!(
                "publisher on {} used before init",
                self.topic
            )));
        }
        debug!(
            topic = %self.topic,
            message_id = command.message_id,
            linear_x = command.linear.x,
            linear_y = command.linear.y,
            linear_z = command.linear.z,
            angular_x = command.angular.x,
            angular_y = command.angular.y,
            angular_z = command.angular.z,
            "twist published"
        );
        self.update_metrics(|m| {
            m.published += 1;
            m.last_message_id = Some(command.message_id);
        })
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.ready {
            info!("Actuation publisher on {} shut down", self.topic);
        }
        self.ready = false;
        Ok(())
    }

    fn metrics(&self) -> ActuatorMetrics {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

/// Pick the sink for the configured topic, falling back to [`NoopSink`].
pub fn sink_from_config(config: &ActuationConfig) -> Box<dyn ActuationSink> {
    match config.topic.as_deref() {
        Some(topic) if !topic.trim().is_empty() => Box::new(TracingSink::new(topic)),
        _ => Box::new(NoopSink),
    }
}

pub fn actuation_error(message: impl Into<String>) -> TeleopError {
    TeleopError::Actuation(message.into())
}
