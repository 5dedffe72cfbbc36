// src/capture/mod.rs

//! Capture binding abstraction.
//!
//! The orchestrator refuses to queue or start work until a capture target
//! has been bound through a [`Controller`]. The real device/screen layer is
//! external; [`shell::ShellController`] binds a target by running its
//! configured connect command, and tests provide their own controllers.

pub mod shell;

pub use shell::ShellController;

use crate::config::TargetConfig;

/// Descriptor of a bindable capture target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub name: String,
    pub connect: String,
    pub address: Option<String>,
}

impl TargetInfo {
    pub fn from_config(name: &str, cfg: &TargetConfig) -> Self {
        Self {
            name: name.to_string(),
            connect: cfg.connect.clone(),
            address: cfg.address.clone(),
        }
    }
}

/// Binds the orchestrator to a live input/output target.
pub trait Controller: Send {
    /// Attempt to bind `target`. `custom` selects the custom-connection mode
    /// used by the `Custom` target.
    fn try_capture(&mut self, target: &TargetInfo, custom: bool) -> bool;
}

impl<F> Controller for F
where
    F: FnMut(&TargetInfo, bool) -> bool + Send,
{
    fn try_capture(&mut self, target: &TargetInfo, custom: bool) -> bool {
        self(target, custom)
    }
}
