// src/task/command.rs

//! Shell command task.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{CancelFlag, Task};
use crate::engine::Reporter;
use crate::types::MessageKind;

/// Stdout prefix that marks a status event emitted by the child process.
pub const EVENT_PREFIX: &str = "::event ";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(script: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(script);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(script);
        c
    }
}

/// Runs a shell command as one task of a chain.
///
/// - Succeeds when the process exits with status 0.
/// - When the cancel flag is raised mid-run the child is killed and the task
///   reports failure.
/// - Stdout lines of the form `::event {"kind": "...", "payload": {...}}` are
///   forwarded to the reporter as status events; everything else is logged.
#[derive(Debug)]
pub struct CommandTask {
    chain: String,
    cmd: String,
    cancel: CancelFlag,
}

impl CommandTask {
    pub fn new(chain: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            cmd: cmd.into(),
            cancel: CancelFlag::default(),
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    fn run_inner(&mut self, reporter: &Reporter) -> Result<bool> {
        info!(chain = %self.chain, cmd = %self.cmd, "starting task process");

        let mut child = shell_command(&self.cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning process for chain '{}'", self.chain))?;

        let stdout_reader = child.stdout.take().map(|out| {
            let reporter = reporter.clone();
            let chain = self.chain.clone();
            thread::spawn(move || forward_stdout(out, &reporter, &chain))
        });

        // Always consume stderr so buffers don't fill; log at debug.
        let stderr_reader = child.stderr.take().map(|err| {
            let chain = self.chain.clone();
            thread::spawn(move || {
                for line in BufReader::new(err).lines().map_while(|l| l.ok()) {
                    debug!(chain = %chain, "stderr: {}", line);
                }
            })
        });

        let status: Option<ExitStatus> = loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("waiting for process of chain '{}'", self.chain))?
            {
                break Some(status);
            }

            if self.cancel.is_cancelled() {
                info!(chain = %self.chain, "cancellation requested; killing task process");
                if let Err(e) = child.kill() {
                    warn!(chain = %self.chain, error = %e, "failed to kill task process");
                }
                let _ = child.wait();
                break None;
            }

            thread::sleep(POLL_INTERVAL);
        };

        let Some(status) = status else {
            // Readers finish on their own once the pipes close.
            return Ok(false);
        };

        // Join so every event line is reported before the task completes.
        for reader in [stdout_reader, stderr_reader].into_iter().flatten() {
            if reader.join().is_err() {
                warn!(chain = %self.chain, "output reader thread panicked");
            }
        }

        info!(
            chain = %self.chain,
            exit_code = status.code().unwrap_or(-1),
            success = status.success(),
            "task process exited"
        );

        Ok(status.success())
    }
}

impl Task for CommandTask {
    fn chain(&self) -> &str {
        &self.chain
    }

    fn bind_cancel(&mut self, flag: CancelFlag) {
        self.cancel = flag;
    }

    fn run(&mut self, reporter: &Reporter) -> bool {
        match self.run_inner(reporter) {
            Ok(success) => success,
            Err(err) => {
                error!(chain = %self.chain, error = %err, "task execution error");
                false
            }
        }
    }
}

/// `::event` line payload.
#[derive(Debug, Deserialize)]
struct EventLine {
    kind: MessageKind,
    #[serde(default)]
    payload: Value,
}

fn forward_stdout(out: impl Read, reporter: &Reporter, chain: &str) {
    for line in BufReader::new(out).lines().map_while(|l| l.ok()) {
        match parse_event_line(&line) {
            Some(Ok(event)) => reporter.report(event.kind, event.payload),
            Some(Err(e)) => {
                warn!(chain = %chain, error = %e, line = %line, "malformed event line");
            }
            None => debug!(chain = %chain, "stdout: {}", line),
        }
    }
}

fn parse_event_line(line: &str) -> Option<serde_json::Result<EventLine>> {
    let body = line.trim_end().strip_prefix(EVENT_PREFIX)?;
    Some(serde_json::from_str(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_not_events() {
        assert!(parse_event_line("building target...").is_none());
    }

    #[test]
    fn event_lines_carry_kind_and_payload() {
        let line = r#"::event {"kind": "stage-drop-report", "payload": {"drops": []}}"#;
        let event = parse_event_line(line).unwrap().unwrap();
        assert_eq!(event.kind, MessageKind::StageDropReport);
        assert_eq!(event.payload["drops"], serde_json::json!([]));
    }

    #[test]
    fn payload_defaults_to_null() {
        let event = parse_event_line(r#"::event {"kind": "capture-image-empty"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, MessageKind::CaptureImageEmpty);
        assert!(event.payload.is_null());
    }

    #[test]
    fn unknown_kind_is_an_error() {
        assert!(parse_event_line(r#"::event {"kind": "explode"}"#).unwrap().is_err());
    }
}
