// src/config/mod.rs

//! Configuration loading and validation for taskchain.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`): the resource directory's
//!   `resource.toml` and the CLI playbook.
//! - Load files from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_playbook, load_resource_config, load_resource_raw, resource_file_path};
pub use model::{
    ChainConfig, CommandConfig, OptionsSection, Playbook, RawPlaybook, RawResourceConfig,
    ResourceConfig, TargetConfig, CUSTOM_TARGET,
};
