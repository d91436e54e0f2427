// src/config/mod.rs

//! Workflow configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a workflow file from disk (`loader.rs`).
//! - Validate references and names (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    BatchConfig, ChainConfig, ConfigFile, RawConfigFile, RegistrySection, StepConfig, StockpileConfig,
    WorkflowSection,
};
pub use validate::validate_config;
