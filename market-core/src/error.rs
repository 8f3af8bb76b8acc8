//! Error types for `market-core`.
//!
//! Stepping the engine is infallible. The only fallible surface is building a
//! session from configuration.

/// Errors raised while loading or validating a [`crate::MarketConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A population must contain at least one agent of each kind.
    #[error("{kind} population must not be empty")]
    EmptyPopulation {
        /// `"producer"` or `"consumer"`.
        kind: &'static str,
    },

    /// A numeric parameter is outside its allowed range.
    #[error("invalid {field}: {reason}")]
    OutOfRange {
        /// Dotted config path of the offending field.
        field: &'static str,
        /// What the allowed range is.
        reason: String,
    },

    /// Failed to parse JSON configuration.
    #[error("failed to parse config JSON: {source}")]
    Json {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },
}
