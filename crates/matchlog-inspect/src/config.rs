//! Inspector configuration loaded from `matchlog.yaml`.
//!
//! ```yaml
//! log_filter: "matchlog_schema=debug,info"
//! pretty: true
//! builder:
//!   initial_capacity: 4096
//! ```

use std::path::Path;

use matchlog_codec::{BuilderConfig, ConfigError};
use serde::Deserialize;

/// Top-level inspector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InspectConfig {
    /// Default `tracing` filter, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Pretty-print the JSON summary.
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Builder settings for writing sample replays.
    #[serde(default)]
    pub builder: BuilderConfig,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            pretty: default_pretty(),
            builder: BuilderConfig::default(),
        }
    }
}

impl InspectConfig {
    /// Load inspector configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse inspector configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

fn default_log_filter() -> String {
    String::from("info")
}

const fn default_pretty() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = InspectConfig::parse("{}").unwrap();
        assert_eq!(config, InspectConfig::default());
    }

    #[test]
    fn nested_builder_section() {
        let yaml = r#"
log_filter: "debug"
pretty: false
builder:
  initial_capacity: 64
  force_defaults: true
"#;
        let config = InspectConfig::parse(yaml).unwrap();
        assert_eq!(config.log_filter, "debug");
        assert!(!config.pretty);
        assert_eq!(config.builder.initial_capacity, 64);
        assert!(config.builder.force_defaults);
        assert!(config.builder.dedup_vtables);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(matches!(
            InspectConfig::parse("pretty: [not, a, bool]"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
