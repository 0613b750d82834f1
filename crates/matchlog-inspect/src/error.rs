//! Error types for the replay inspector binary.
//!
//! [`InspectError`] wraps every failure the inspector can hit so that its
//! helpers can propagate with `?`; `main` adds file context on top.

use std::path::PathBuf;

use matchlog_codec::{ConfigError, DecodeError};
use matchlog_schema::SchemaError;

/// Top-level error for the inspector.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A replay file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The replay's root structure is unreadable.
    #[error("decode error: {source}")]
    Decode {
        /// The underlying decode error.
        #[from]
        source: DecodeError,
    },

    /// Encoding the sample replay failed.
    #[error("schema error: {source}")]
    Schema {
        /// The underlying schema error.
        #[from]
        source: SchemaError,
    },

    /// The summary could not be rendered as JSON.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
