use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of a status message delivered to the observer.
///
/// Serialized in kebab-case (`"task-chain-completed"`), which is also the
/// form accepted by [`FromStr`] and used by `CommandTask`'s `::event` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Resource loading failed while constructing the orchestrator.
    InitFailed,
    /// The last task of a chain finished successfully.
    TaskChainCompleted,
    /// The queue drained after a successful task.
    AllTasksCompleted,
    /// A task returned failure (or panicked).
    TaskError,
    /// The capture layer handed back no device/screen handle.
    CapturePointerNull,
    /// The capture layer returned an empty image.
    CaptureImageEmpty,
    /// A stage finished and reported its item drops.
    StageDropReport,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::InitFailed,
        MessageKind::TaskChainCompleted,
        MessageKind::AllTasksCompleted,
        MessageKind::TaskError,
        MessageKind::CapturePointerNull,
        MessageKind::CaptureImageEmpty,
        MessageKind::StageDropReport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::InitFailed => "init-failed",
            MessageKind::TaskChainCompleted => "task-chain-completed",
            MessageKind::AllTasksCompleted => "all-tasks-completed",
            MessageKind::TaskError => "task-error",
            MessageKind::CapturePointerNull => "capture-pointer-null",
            MessageKind::CaptureImageEmpty => "capture-image-empty",
            MessageKind::StageDropReport => "stage-drop-report",
        }
    }

    /// Capture failures abort the whole run.
    pub fn is_capture_failure(self) -> bool {
        matches!(
            self,
            MessageKind::CapturePointerNull | MessageKind::CaptureImageEmpty
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("unknown message kind: {wanted}"))
    }
}

/// How the default capture binding picks its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectType {
    /// Try every configured target in order until one binds.
    #[default]
    Emulator,
    /// Bind the target named `Custom` in custom mode.
    Custom,
}

impl FromStr for ConnectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emulator" => Ok(ConnectType::Emulator),
            "custom" => Ok(ConnectType::Custom),
            other => Err(format!(
                "invalid connect_type: {other} (expected \"emulator\" or \"custom\")"
            )),
        }
    }
}
