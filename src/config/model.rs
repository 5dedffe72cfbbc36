// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::ConnectType;

/// Name of the target bound by `catch_custom`.
pub const CUSTOM_TARGET: &str = "Custom";

/// `resource.toml` as read from disk, before validation.
///
/// ```toml
/// [options]
/// task_delay_ms = 500
/// connect_type = "emulator"
///
/// [target.Local]
/// connect = "adb connect 127.0.0.1:5555"
///
/// [item]
/// "30011" = "Orirock"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawResourceConfig {
    #[serde(default)]
    pub options: OptionsSection,

    /// Capture targets keyed by name.
    #[serde(default)]
    pub target: BTreeMap<String, TargetConfig>,

    /// Item id -> display name.
    #[serde(default)]
    pub item: BTreeMap<String, String>,
}

/// Validated resource configuration.
///
/// Constructed only via `TryFrom<RawResourceConfig>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    pub options: OptionsSection,
    pub target: BTreeMap<String, TargetConfig>,
    pub item: BTreeMap<String, String>,
}

impl ResourceConfig {
    pub(crate) fn new_unchecked(
        options: OptionsSection,
        target: BTreeMap<String, TargetConfig>,
        item: BTreeMap<String, String>,
    ) -> Self {
        Self {
            options,
            target,
            item,
        }
    }
}

/// `[options]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionsSection {
    /// Minimum time between the start of two consecutive tasks.
    #[serde(default = "default_task_delay_ms")]
    pub task_delay_ms: u64,

    #[serde(default)]
    pub connect_type: ConnectType,
}

fn default_task_delay_ms() -> u64 {
    500
}

impl OptionsSection {
    pub fn task_delay(&self) -> Duration {
        Duration::from_millis(self.task_delay_ms)
    }
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self {
            task_delay_ms: default_task_delay_ms(),
            connect_type: ConnectType::default(),
        }
    }
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Command that binds the device; success means the target is live.
    pub connect: String,

    /// Free-form address, passed to the connect command as `TASKCHAIN_TARGET_ADDRESS`.
    #[serde(default)]
    pub address: Option<String>,
}

/// Playbook of task chains for the CLI, before validation.
///
/// ```toml
/// [[chain]]
/// name = "Build"
///
/// [[chain.task]]
/// cmd = "make"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlaybook {
    #[serde(default)]
    pub chain: Vec<ChainConfig>,
}

/// Validated playbook.
#[derive(Debug, Clone)]
pub struct Playbook {
    pub chain: Vec<ChainConfig>,
}

impl Playbook {
    pub(crate) fn new_unchecked(chain: Vec<ChainConfig>) -> Self {
        Self { chain }
    }
}

/// `[[chain]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Chain label shared by every task in the chain.
    pub name: String,

    #[serde(default)]
    pub task: Vec<CommandConfig>,
}

/// `[[chain.task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Shell command to execute.
    pub cmd: String,
}
