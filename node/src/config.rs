//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use vigil_types::ProtocolParams;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a Vigil node.
///
/// Loaded from a TOML file via [`NodeConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter, e.g. "info" or "info,vigil_consensus=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Username of the genesis account.
    #[serde(default = "default_genesis_username")]
    pub genesis_username: String,

    /// Delegates opened and funded from the genesis balance at boot.
    #[serde(default = "default_genesis_delegates")]
    pub genesis_delegates: usize,

    /// Capacity of the request queue feeding the node.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Fees, rewards and limits.
    #[serde(default)]
    pub params: ProtocolParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_genesis_username() -> String {
    "genesis".into()
}

fn default_genesis_delegates() -> usize {
    101
}

fn default_queue_capacity() -> usize {
    100
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    fn validate(&self) -> Result<(), NodeError> {
        self.log_format()?;
        if self.params.max_forgers == 0 {
            return Err(NodeError::Config("max_forgers must be at least 1".into()));
        }
        if self.params.max_delegates_per_block == 0 {
            return Err(NodeError::Config(
                "max_delegates_per_block must be at least 1".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(NodeError::Config("queue_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            genesis_username: default_genesis_username(),
            genesis_delegates: default_genesis_delegates(),
            queue_capacity: default_queue_capacity(),
            params: ProtocolParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_types::Amount;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, "human");
        assert_eq!(config.genesis_username, "genesis");
        assert_eq!(config.genesis_delegates, 101);
        assert_eq!(config.params, ProtocolParams::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_format = "json"
            genesis_delegates = 3

            [params]
            transaction_fee = "0.5"
            max_forgers = 7
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.genesis_delegates, 3);
        assert_eq!(config.params.transaction_fee, Amount::new(500_000));
        assert_eq!(config.params.max_forgers, 7);
        assert_eq!(config.params.voting_fee, Amount::from_units(1));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for toml in [
            "log_format = \"xml\"",
            "queue_capacity = 0",
            "[params]\nmax_forgers = 0",
        ] {
            assert!(matches!(
                NodeConfig::from_toml_str(toml),
                Err(NodeError::Config(_))
            ));
        }
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/vigil.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
