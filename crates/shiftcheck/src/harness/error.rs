use crate::RuntimeErrorCode;
use thiserror::Error;

/// Invalid harness or scenario configuration. Always raised before
/// simulated time advances.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration `{field}`: {reason}")]
pub struct ConfigError {
    pub field: String,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeErrorCode),
    #[error(
        "output mismatch in phase '{phase}' at event {event} (t={time}): expected {expected}, got {actual}"
    )]
    Mismatch {
        phase: String,
        event: u64,
        time: u64,
        expected: u8,
        actual: u8,
    },
    #[error("aggregate mismatch over {scope}: expected {expected} ones, observed {observed}")]
    AggregateMismatch {
        scope: String,
        expected: u64,
        observed: u64,
    },
}
