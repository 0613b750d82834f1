//! Error types for the `matchlog-schema` crate.
//!
//! Decoding an owned object surfaces the codec's [`DecodeError`] directly.
//! Encoding can additionally fail on values that have no wire form, such
//! as an action or event that was decoded from an unknown tag.

use matchlog_codec::{BuildError, DecodeError};

/// Errors that can occur when encoding or decoding schema objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The builder rejected a write.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// The buffer being read is structurally invalid.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An action decoded from an unknown tag cannot be written back.
    #[error("action with unknown tag {tag} cannot be encoded")]
    UnencodableAction {
        /// The unrecognized tag.
        tag: u8,
    },

    /// An event decoded from an unknown tag cannot be written back.
    #[error("event with unknown tag {tag} cannot be encoded")]
    UnencodableEvent {
        /// The unrecognized tag.
        tag: u8,
    },
}
