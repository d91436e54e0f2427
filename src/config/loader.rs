// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read a workflow file and deserialize it into a [`RawConfigFile`].
///
/// Only TOML deserialization happens here; semantic checks (chain
/// references, header names, ...) are done by [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a workflow file and validate it.
///
/// This is the entry point the rest of the crate uses:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks:
///   - at least one step or stockpile,
///   - header keys are variable names,
///   - chains reference known steps and do not share steps,
///   - stockpiles declare outputs and a success file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Default workflow file: `Sdmflow.toml` in the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sdmflow.toml")
}
