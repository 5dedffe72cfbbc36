// src/config/validate.rs

use crate::config::model::{
    CUSTOM_TARGET, Playbook, RawPlaybook, RawResourceConfig, ResourceConfig,
};
use crate::errors::{Result, TaskchainError};
use crate::types::ConnectType;

/// Upper bound for `[options].task_delay_ms`.
pub const MAX_TASK_DELAY_MS: u64 = 60_000;

impl TryFrom<RawResourceConfig> for ResourceConfig {
    type Error = TaskchainError;

    fn try_from(raw: RawResourceConfig) -> std::result::Result<Self, Self::Error> {
        validate_resource_config(&raw)?;
        Ok(ResourceConfig::new_unchecked(raw.options, raw.target, raw.item))
    }
}

impl TryFrom<RawPlaybook> for Playbook {
    type Error = TaskchainError;

    fn try_from(raw: RawPlaybook) -> std::result::Result<Self, Self::Error> {
        validate_playbook(&raw)?;
        Ok(Playbook::new_unchecked(raw.chain))
    }
}

fn validate_resource_config(cfg: &RawResourceConfig) -> Result<()> {
    validate_options(cfg)?;
    validate_targets(cfg)?;
    Ok(())
}

fn validate_options(cfg: &RawResourceConfig) -> Result<()> {
    if cfg.options.task_delay_ms > MAX_TASK_DELAY_MS {
        return Err(TaskchainError::ConfigError(format!(
            "[options].task_delay_ms must be <= {MAX_TASK_DELAY_MS} (got {})",
            cfg.options.task_delay_ms
        )));
    }

    if cfg.options.connect_type == ConnectType::Custom
        && !cfg.target.contains_key(CUSTOM_TARGET)
    {
        return Err(TaskchainError::ConfigError(format!(
            "connect_type = \"custom\" requires a [target.{CUSTOM_TARGET}] section"
        )));
    }

    Ok(())
}

fn validate_targets(cfg: &RawResourceConfig) -> Result<()> {
    for (name, target) in cfg.target.iter() {
        if target.connect.trim().is_empty() {
            return Err(TaskchainError::ConfigError(format!(
                "target '{}' has an empty `connect` command",
                name
            )));
        }
    }
    Ok(())
}

fn validate_playbook(pb: &RawPlaybook) -> Result<()> {
    if pb.chain.is_empty() {
        return Err(TaskchainError::ConfigError(
            "playbook must contain at least one [[chain]] entry".to_string(),
        ));
    }

    for (idx, chain) in pb.chain.iter().enumerate() {
        if chain.name.trim().is_empty() {
            return Err(TaskchainError::ConfigError(format!(
                "chain #{} has an empty name",
                idx + 1
            )));
        }
        if chain.task.is_empty() {
            return Err(TaskchainError::ConfigError(format!(
                "chain '{}' must contain at least one [[chain.task]]",
                chain.name
            )));
        }
        if chain.task.iter().any(|t| t.cmd.trim().is_empty()) {
            return Err(TaskchainError::ConfigError(format!(
                "chain '{}' has a task with an empty `cmd`",
                chain.name
            )));
        }
    }

    Ok(())
}
