//! Base error type.
//!
//! Sub-crates define their own error enums and either convert into
//! `HiveError` via `From` or wrap it as one variant.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `hive-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum HiveError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `hive-*` crates.
pub type HiveResult<T> = Result<T, HiveError>;
