// src/config/validate.rs

use std::collections::HashMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::is_valid_header_key;
use crate::errors::{Result, SdmflowError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SdmflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every semantic check on an unvalidated config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_workflow(cfg)?;
    validate_headers(cfg)?;
    validate_steps(cfg)?;
    validate_chains(cfg)?;
    validate_stockpiles(cfg)?;
    validate_batches(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.step.is_empty() && cfg.stockpile.is_empty() && cfg.batch.is_empty() {
        return Err(SdmflowError::ConfigError(
            "config must contain at least one [step.<name>], [stockpile.<name>] or \
             [batch.<name>] section"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_workflow(cfg: &RawConfigFile) -> Result<()> {
    if cfg.workflow.owner.trim().is_empty() {
        return Err(SdmflowError::ConfigError(
            "[workflow].owner must not be empty".to_string(),
        ));
    }
    if cfg.workflow.tool.trim().is_empty() {
        return Err(SdmflowError::ConfigError(
            "[workflow].tool must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_headers(cfg: &RawConfigFile) -> Result<()> {
    for (key, value) in cfg.headers.iter() {
        if !is_valid_header_key(key) {
            return Err(SdmflowError::ConfigError(format!(
                "header key '{}' is not a valid variable name",
                key
            )));
        }
        if value.contains(['\n', '\r']) {
            return Err(SdmflowError::ConfigError(format!(
                "header '{}' has a line break in its value",
                key
            )));
        }
    }
    Ok(())
}

fn validate_steps(cfg: &RawConfigFile) -> Result<()> {
    for (name, step) in cfg.step.iter() {
        if step.cmd.is_empty() || step.cmd[0].trim().is_empty() {
            return Err(SdmflowError::ConfigError(format!(
                "step '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_chains(cfg: &RawConfigFile) -> Result<()> {
    let mut owner_of: HashMap<&str, &str> = HashMap::new();

    for (name, chain) in cfg.chain.iter() {
        if chain.steps.is_empty() {
            return Err(SdmflowError::ConfigError(format!(
                "chain '{}' must list at least one step",
                name
            )));
        }
        if cfg.step.contains_key(name) {
            return Err(SdmflowError::ConfigError(format!(
                "chain '{}' has the same name as a step",
                name
            )));
        }
        for step in chain.steps.iter() {
            if !cfg.step.contains_key(step) {
                return Err(SdmflowError::ConfigError(format!(
                    "chain '{}' has unknown step '{}' in `steps`",
                    name, step
                )));
            }
            if let Some(other) = owner_of.insert(step.as_str(), name.as_str()) {
                return Err(SdmflowError::ConfigError(format!(
                    "step '{}' is used by both chain '{}' and chain '{}'",
                    step, other, name
                )));
            }
        }
    }
    Ok(())
}

fn validate_stockpiles(cfg: &RawConfigFile) -> Result<()> {
    for (name, sp) in cfg.stockpile.iter() {
        if sp.outputs.is_empty() {
            return Err(SdmflowError::ConfigError(format!(
                "stockpile '{}' must list at least one output",
                name
            )));
        }
        if sp.success.trim().is_empty() {
            return Err(SdmflowError::ConfigError(format!(
                "stockpile '{}' must name a success file",
                name
            )));
        }
        if sp.status.is_some() && sp.status_file.is_some() {
            return Err(SdmflowError::ConfigError(format!(
                "stockpile '{}' sets both `status` and `status_file`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_batches(cfg: &RawConfigFile) -> Result<()> {
    for (name, batch) in cfg.batch.iter() {
        if batch.manifest.trim().is_empty() {
            return Err(SdmflowError::ConfigError(format!(
                "batch '{}' must name a manifest",
                name
            )));
        }
        if batch.success.trim().is_empty() {
            return Err(SdmflowError::ConfigError(format!(
                "batch '{}' must name a success file",
                name
            )));
        }
    }
    Ok(())
}
