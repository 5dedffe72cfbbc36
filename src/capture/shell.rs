// src/capture/shell.rs

//! Controller that binds a target by running its `connect` command.

use std::process::Stdio;

use tracing::{debug, info, warn};

use super::{Controller, TargetInfo};
use crate::task::command::shell_command;

/// Binds targets by running `target.connect` through the platform shell.
///
/// Exit status 0 means the target is live. The last bound target name is
/// remembered for diagnostics.
#[derive(Debug, Default)]
pub struct ShellController {
    bound: Option<String>,
}

impl ShellController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the most recently bound target, if the last attempt succeeded.
    pub fn bound_target(&self) -> Option<&str> {
        self.bound.as_deref()
    }
}

impl Controller for ShellController {
    fn try_capture(&mut self, target: &TargetInfo, custom: bool) -> bool {
        self.bound = None;

        let mut cmd = shell_command(&target.connect);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .env("TASKCHAIN_TARGET_NAME", &target.name)
            .env("TASKCHAIN_TARGET_CUSTOM", if custom { "1" } else { "0" });
        if let Some(ref address) = target.address {
            cmd.env("TASKCHAIN_TARGET_ADDRESS", address);
        }

        debug!(target_name = %target.name, custom, cmd = %target.connect, "trying capture target");

        match cmd.status() {
            Ok(status) if status.success() => {
                info!(target_name = %target.name, custom, "capture target bound");
                self.bound = Some(target.name.clone());
                true
            }
            Ok(status) => {
                debug!(
                    target_name = %target.name,
                    exit_code = status.code().unwrap_or(-1),
                    "connect command failed"
                );
                false
            }
            Err(e) => {
                warn!(target_name = %target.name, error = %e, "failed to spawn connect command");
                false
            }
        }
    }
}
