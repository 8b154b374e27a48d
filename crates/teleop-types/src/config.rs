use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, TeleopError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub url: String,
    pub peer_type: String,
    pub heartbeat_secs: u64,
    pub connect_timeout_secs: u64,
    pub outbound_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws/data".into(),
            peer_type: "python".into(),
            heartbeat_secs: 25,
            connect_timeout_secs: 5,
            outbound_capacity: 256,
        }
    }
}

impl TransportConfig {
    /// URL with the peer type announced to the relay as a query parameter.
    pub fn endpoint(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}type={}", self.url, separator, self.peer_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_secs: u64,
    pub samples: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            samples: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub window: usize,
    pub report_interval_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window: 100,
            report_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuationConfig {
    /// Topic to publish decoded velocities on; no sink when absent.
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    pub log_level: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleopConfig {
    pub transport: TransportConfig,
    pub sync: SyncConfig,
    pub stats: StatsConfig,
    pub actuation: ActuationConfig,
    pub ops: OpsConfig,
}

impl TeleopConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            TeleopError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            TeleopError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.transport.url.trim().is_empty() {
            return Err(TeleopError::Configuration(
                "transport.url must not be empty".into(),
            ));
        }
        if self.transport.outbound_capacity == 0 {
            return Err(TeleopError::Configuration(
                "transport.outbound_capacity must be greater than zero".into(),
            ));
        }
        if self.transport.heartbeat_secs == 0 || self.transport.connect_timeout_secs == 0 {
            return Err(TeleopError::Configuration(
                "transport heartbeat and connect timeout must be greater than zero".into(),
            ));
        }
        if self.sync.samples == 0 {
            return Err(TeleopError::Configuration(
                "sync.samples must be greater than zero".into(),
            ));
        }
        if self.sync.interval_secs == 0 {
            return Err(TeleopError::Configuration(
                "sync.interval_secs must be greater than zero".into(),
            ));
        }
        if self.stats.window == 0 {
            return Err(TeleopError::Configuration(
                "stats.window must be greater than zero".into(),
            ));
        }
        if self.stats.report_interval_secs == 0 {
            return Err(TeleopError::Configuration(
                "stats.report_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_config_from_file() {
        let temp_path = std::env::temp_dir().join("teleop-config-test.toml");
        let mut config = TeleopConfig::default();
        config.transport.url = "ws://relay.local:9000/ws/data".into();
        config.sync.samples = 5;
        config.actuation.topic = Some("/cmd_vel".into());
        config.ops.log_level = "debug".into();

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = TeleopConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded.transport.url, config.transport.url);
        assert_eq!(loaded.sync.samples, 5);
        assert_eq!(loaded.actuation.topic.as_deref(), Some("/cmd_vel"));
        assert_eq!(loaded.stats.window, 100);
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let config: TeleopConfig = toml::from_str(
            r#"
            [sync]
            interval_secs = 2
            "#,
        )
        .expect("parse partial config");
        assert_eq!(config.sync.interval_secs, 2);
        assert_eq!(config.sync.samples, 10);
        assert_eq!(config.transport.peer_type, "python");
        assert!(config.actuation.topic.is_none());
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = TeleopConfig::from_file("/nonexistent/teleop.toml").unwrap_err();
        assert!(matches!(err, TeleopError::Configuration(_)));
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = TeleopConfig::default();
        assert!(config.validate().is_ok());

        config.transport.url = "  ".into();
        assert!(config.validate().is_err());
        config.transport.url = "ws://localhost:8080/ws/data".into();
        config.sync.samples = 0;
        assert!(config.validate().is_err());
        config.sync.samples = 10;
        config.stats.window = 0;
        assert!(config.validate().is_err());
        config.stats.window = 100;
        config.sync.interval_secs = 0;
        assert!(config.validate().is_err());
        config.sync.interval_secs = 10;
        config.transport.outbound_capacity = 0;
        assert!(config.validate().is_err());
        config.transport.outbound_capacity = 256;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn endpoint_appends_peer_type() {
        let mut transport = TransportConfig::default();
        assert_eq!(transport.endpoint(), "ws://localhost:8080/ws/data?type=python");
        transport.url = "ws://host/ws?token=abc".into();
        assert_eq!(transport.endpoint(), "ws://host/ws?token=abc&type=python");
    }
}
