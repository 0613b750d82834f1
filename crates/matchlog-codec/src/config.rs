//! Builder configuration.
//!
//! The builder's tunables can be set in code or loaded from YAML, usually
//! as the `builder:` section of a tool's configuration file:
//!
//! ```yaml
//! builder:
//!   initial_capacity: 4096
//!   max_buffer_size: 67108864
//!   force_defaults: false
//!   dedup_vtables: true
//! ```
//!
//! Every field is optional; omitted fields take the values documented on
//! [`BuilderConfig`].

use std::path::Path;

use serde::Deserialize;

use crate::buffer::DEFAULT_MAX_BUFFER_SIZE;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Tunables for a [`Builder`](crate::Builder).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuilderConfig {
    /// Bytes allocated up front. The buffer doubles when it runs out.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Hard upper bound on the finished buffer size.
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,

    /// Write scalar fields even when they equal the schema default.
    #[serde(default)]
    pub force_defaults: bool,

    /// Share identical vtables between tables.
    #[serde(default = "default_true")]
    pub dedup_vtables: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            max_buffer_size: default_max_buffer_size(),
            force_defaults: false,
            dedup_vtables: default_true(),
        }
    }
}

impl BuilderConfig {
    /// Load builder configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse builder configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

const fn default_initial_capacity() -> usize {
    1024
}

const fn default_max_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER_SIZE
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.initial_capacity, 1024);
        assert_eq!(config.max_buffer_size, 0x7FFF_FFFF);
        assert!(!config.force_defaults);
        assert!(config.dedup_vtables);
    }

    #[test]
    fn parse_partial_yaml() {
        let config = BuilderConfig::parse("initial_capacity: 64\nforce_defaults: true\n").unwrap();
        assert_eq!(config.initial_capacity, 64);
        assert!(config.force_defaults);
        assert_eq!(config.max_buffer_size, 0x7FFF_FFFF);
        assert!(config.dedup_vtables);
    }

    #[test]
    fn parse_rejects_wrong_types() {
        let result = BuilderConfig::parse("initial_capacity: lots\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = BuilderConfig::from_file(Path::new("/nonexistent/matchlog.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
