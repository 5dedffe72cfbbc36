#![allow(dead_code)]

use taskchain::config::{
    ChainConfig, CommandConfig, Playbook, RawPlaybook, RawResourceConfig, ResourceConfig,
    TargetConfig,
};
use taskchain::types::ConnectType;

/// Builder for `ResourceConfig` to simplify test setup.
pub struct ResourceConfigBuilder {
    config: RawResourceConfig,
}

impl ResourceConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawResourceConfig::default();
        config.options.task_delay_ms = 0;
        Self { config }
    }

    pub fn task_delay_ms(mut self, ms: u64) -> Self {
        self.config.options.task_delay_ms = ms;
        self
    }

    pub fn connect_type(mut self, connect_type: ConnectType) -> Self {
        self.config.options.connect_type = connect_type;
        self
    }

    pub fn with_target(mut self, name: &str, connect: &str) -> Self {
        self.config.target.insert(
            name.to_string(),
            TargetConfig {
                connect: connect.to_string(),
                address: None,
            },
        );
        self
    }

    pub fn with_item(mut self, id: &str, name: &str) -> Self {
        self.config.item.insert(id.to_string(), name.to_string());
        self
    }

    pub fn build_raw(self) -> RawResourceConfig {
        self.config
    }

    pub fn build(self) -> ResourceConfig {
        ResourceConfig::try_from(self.config).expect("Failed to build valid resource config")
    }
}

impl Default for ResourceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `Playbook`.
pub struct PlaybookBuilder {
    playbook: RawPlaybook,
}

impl PlaybookBuilder {
    pub fn new() -> Self {
        Self {
            playbook: RawPlaybook::default(),
        }
    }

    pub fn chain(mut self, name: &str, cmds: &[&str]) -> Self {
        self.playbook.chain.push(ChainConfig {
            name: name.to_string(),
            task: cmds
                .iter()
                .map(|cmd| CommandConfig {
                    cmd: cmd.to_string(),
                })
                .collect(),
        });
        self
    }

    pub fn build_raw(self) -> RawPlaybook {
        self.playbook
    }

    pub fn build(self) -> Playbook {
        Playbook::try_from(self.playbook).expect("Failed to build valid playbook")
    }
}

impl Default for PlaybookBuilder {
    fn default() -> Self {
        Self::new()
    }
}
