//! Configuration types for the netstate system

use serde::{Deserialize, Serialize};

/// Main netstate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetStateConfig {
    /// Where change batches come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Engine and service settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Snapshot file to reconcile against at startup
    #[serde(default)]
    pub initial_snapshot: Option<String>,
}

impl NetStateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.engine.validate()?;

        if let Some(path) = &self.initial_snapshot
            && path.is_empty()
        {
            return Err(crate::Error::config("Initial snapshot path cannot be empty"));
        }

        Ok(())
    }
}

/// Event source configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// JSON-encoded batches, one per line on standard input
    #[default]
    Stdin,

    /// Batches pushed through an in-process channel
    Channel,
}

impl SourceConfig {
    /// Source type name
    pub fn type_name(&self) -> &'static str {
        match self {
            SourceConfig::Stdin => "stdin",
            SourceConfig::Channel => "channel",
        }
    }
}

/// Engine and service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the change notification channel
    ///
    /// When full, notifications are dropped with a warning. The engine never
    /// blocks on a slow consumer.
    ///
    /// Default: 1000 notifications
    #[serde(default = "default_change_channel_capacity")]
    pub change_channel_capacity: usize,

    /// Capacity of the service request channel
    #[serde(default = "default_request_channel_capacity")]
    pub request_channel_capacity: usize,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.change_channel_capacity == 0 {
            return Err(crate::Error::config("Change channel capacity must be > 0"));
        }
        if self.request_channel_capacity == 0 {
            return Err(crate::Error::config("Request channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            change_channel_capacity: default_change_channel_capacity(),
            request_channel_capacity: default_request_channel_capacity(),
        }
    }
}

fn default_change_channel_capacity() -> usize {
    1000
}

fn default_request_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NetStateConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.source, SourceConfig::Stdin);
        assert_eq!(config.engine.change_channel_capacity, 1000);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = NetStateConfig::new();
        config.engine.change_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_snapshot_path_rejected() {
        let mut config = NetStateConfig::new();
        config.initial_snapshot = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: NetStateConfig = serde_json::from_str(
            r#"{"source": {"type": "channel"}, "engine": {"request_channel_capacity": 8}}"#,
        )
        .unwrap();
        assert_eq!(config.source, SourceConfig::Channel);
        assert_eq!(config.engine.request_channel_capacity, 8);
        assert_eq!(config.engine.change_channel_capacity, 1000);
    }
}
