//! Bus configuration

use serde::{Deserialize, Serialize};

/// Configuration shared by the in-memory bus and the spawned transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusConfig {
    /// Transport name reported by `EventTransport::name` and in log fields
    #[serde(default = "default_name")]
    pub name: String,

    /// Warn when an event accumulates more listeners than this
    ///
    /// A hint for spotting listener leaks, never enforced. 0 disables the
    /// warning.
    #[serde(default)]
    pub max_listeners: usize,
}

fn default_name() -> String {
    "memory".to_string()
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_listeners: 0,
        }
    }
}

impl BusConfig {
    /// Set the transport name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the listener-leak warning threshold
    pub fn with_max_listeners(mut self, max_listeners: usize) -> Self {
        self.max_listeners = max_listeners;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = BusConfig::default();
        assert_eq!(config.name, "memory");
        assert_eq!(config.max_listeners, 0);
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: BusConfig = serde_json::from_str(r#"{"maxListeners": 10}"#).unwrap();
        assert_eq!(config.name, "memory");
        assert_eq!(config.max_listeners, 10);

        let config: BusConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BusConfig::default());
    }

    #[test]
    fn test_config_builder() {
        let config = BusConfig::default().with_name("ui").with_max_listeners(3);
        assert_eq!(config.name, "ui");
        assert_eq!(config.max_listeners, 3);
    }
}
