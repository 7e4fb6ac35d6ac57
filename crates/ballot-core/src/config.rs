//! Configuration for the allocation framework and the node fan-out.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::allocation::EnableAllocation;
use crate::domain::ConfigError;

/// Top-level configuration, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallotConfig {
    /// Name reported in combined nodes responses.
    pub cluster_name: String,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub allocation: AllocationConfig,
    pub fanout: FanoutConfig,
}

impl Default for BallotConfig {
    fn default() -> Self {
        Self {
            cluster_name: "ballot".to_string(),
            log_level: "info".to_string(),
            allocation: AllocationConfig::default(),
            fanout: FanoutConfig::default(),
        }
    }
}

impl BallotConfig {
    /// Load and validate configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "cluster_name".to_string(),
                reason: "cluster name must not be empty".to_string(),
            });
        }
        if self.fanout.node_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "fanout.node_timeout_ms".to_string(),
                reason: "timeout must be non-zero when set".to_string(),
            });
        }
        Ok(())
    }

    /// Verbose settings for local runs.
    pub fn development() -> Self {
        Self {
            cluster_name: "dev-cluster".to_string(),
            log_level: "debug".to_string(),
            allocation: AllocationConfig {
                debug_decisions: true,
                enable: EnableAllocation::All,
            },
            fanout: FanoutConfig {
                node_timeout_ms: Some(1_000),
                accumulate_failures: true,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Keep every decider's vote and explanation instead of the bare verdict.
    pub debug_decisions: bool,
    pub enable: EnableAllocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Per-node timeout; unset waits for every node.
    pub node_timeout_ms: Option<u64>,
    pub accumulate_failures: bool,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            node_timeout_ms: None,
            accumulate_failures: true,
        }
    }
}

impl FanoutConfig {
    pub fn node_timeout(&self) -> Option<Duration> {
        self.node_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn missing_fields_take_defaults() {
        let config: BallotConfig = serde_json::from_str(r#"{"allocation": {"enable": "primaries"}}"#).unwrap();
        assert_eq!(config.cluster_name, "ballot");
        assert_eq!(config.allocation.enable, EnableAllocation::Primaries);
        assert!(!config.allocation.debug_decisions);
        assert!(config.fanout.accumulate_failures);
        assert_eq!(config.fanout.node_timeout(), None);
    }

    #[test]
    fn development_config_is_valid() {
        let config = BallotConfig::development();
        config.validate().unwrap();
        assert_eq!(config.fanout.node_timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn rejects_empty_cluster_name() {
        let config = BallotConfig {
            cluster_name: "  ".to_string(),
            ..BallotConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "cluster_name"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = BallotConfig::default();
        config.fanout.node_timeout_ms = Some(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "fanout.node_timeout_ms"));
    }

    #[test]
    fn from_file_reads_and_validates() {
        let path = std::env::temp_dir().join(format!("ballot-config-{}.json", ulid::Ulid::new()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"cluster_name": "prod", "fanout": {{"node_timeout_ms": 250}}}}"#).unwrap();
        drop(file);

        let config = BallotConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.cluster_name, "prod");
        assert_eq!(config.fanout.node_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = BallotConfig::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
