// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdmflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A job's required input is absent while the graph is being assembled.
    #[error("required input '{input}' for job '{job}' does not exist")]
    MissingRequiredInput { job: String, input: String },

    /// A header line would not parse back as `KEY=value`.
    #[error("invalid header '{key}': {reason}")]
    InvalidHeader { key: String, reason: String },

    #[error("a chain must contain at least one job")]
    EmptyChain,

    #[error("no rules to compute, refusing to write an empty document")]
    EmptyDocument,

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    /// The registry collaborator rejected or failed a status update.
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SdmflowError>;
