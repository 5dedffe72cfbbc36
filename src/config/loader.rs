// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{Playbook, RawPlaybook, RawResourceConfig, ResourceConfig};
use crate::errors::Result;

/// File name looked up inside a resource directory.
pub const RESOURCE_FILE: &str = "resource.toml";

/// Load `resource.toml` from a resource directory without semantic validation.
pub fn load_resource_raw(dir: impl AsRef<Path>) -> Result<RawResourceConfig> {
    let path = resource_file_path(dir);
    let contents = fs::read_to_string(&path)?;

    let config: RawResourceConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load and validate `resource.toml` from a resource directory.
pub fn load_resource_config(dir: impl AsRef<Path>) -> Result<ResourceConfig> {
    let raw = load_resource_raw(dir)?;
    ResourceConfig::try_from(raw)
}

/// Load and validate a playbook file.
pub fn load_playbook(path: impl AsRef<Path>) -> Result<Playbook> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawPlaybook = toml::from_str(&contents)?;
    Playbook::try_from(raw)
}

pub fn resource_file_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(RESOURCE_FILE)
}
