//! Error types for the trigger engine
//!
//! Trigger evaluation is fail-open: errors defined here are logged at the
//! point of failure and reported to the rule engine as "did not fire"
//! rather than propagated up the dispatch loop.

use thiserror::Error;

/// Errors that can occur during trigger evaluation
#[derive(Debug, Error)]
pub enum EngineError {
    /// Pattern failed to compile
    #[error("Invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// The list store could not resolve a guild list
    #[error("Guild list lookup failed: {0}")]
    ListLookup(String),

    /// Trigger was invoked with configuration data of the wrong shape
    #[error("Configuration mismatch: expected {expected} data, got {got}")]
    DataMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// Stored settings could not be decoded into typed configuration data
    #[error("Failed to decode trigger settings: {0}")]
    DecodeSettings(#[from] serde_json::Error),

    /// An external checker (phishing, safe browsing) failed
    #[error("External check failed: {0}")]
    ExternalCheck(String),

    /// Generic error
    #[error("Automod error: {0}")]
    Other(String),
}

impl EngineError {
    /// Wrap a regex compile failure together with the offending pattern
    pub fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source: Box::new(source),
        }
    }
}

/// Convert a string into an EngineError
impl From<String> for EngineError {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

/// Result type for trigger evaluation
pub type EngineResult<T> = Result<T, EngineError>;
