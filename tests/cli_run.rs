// tests/cli_run.rs
#![cfg(unix)]

mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use taskchain::cli::{CliArgs, TargetBinding};
use taskchain::config::resource_file_path;
use taskchain::errors::TaskchainError;

const RESOURCE: &str = r#"
[options]
task_delay_ms = 0

[target.Local]
connect = "true"

[item]
"30011" = "Orirock"
"#;

/// A resource directory and a playbook on disk, with args pointing at both.
/// `{dir}` in the playbook expands to the directory path.
fn workspace(playbook: &str) -> (TempDir, CliArgs) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    fs::write(resource_file_path(dir.path()), RESOURCE).unwrap();
    let playbook_path = dir.path().join("playbook.toml");
    fs::write(&playbook_path, playbook.replace("{dir}", &path_str(dir.path()))).unwrap();

    let args = CliArgs {
        resource_dir: path_str(dir.path()),
        playbook: path_str(&playbook_path),
        binding: TargetBinding {
            fake: true,
            ..TargetBinding::default()
        },
        log_level: None,
        dry_run: false,
    };
    (dir, args)
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[tokio::test]
async fn passing_playbook_runs_to_completion() {
    let (_dir, args) = workspace(
        r#"
[[chain]]
name = "Build"
[[chain.task]]
cmd = "true"
[[chain.task]]
cmd = "echo built"

[[chain]]
name = "Ship"
[[chain.task]]
cmd = "true"
"#,
    );

    taskchain::run(args).await.unwrap();
}

#[tokio::test]
async fn failing_last_task_fails_the_run() {
    let (_dir, args) = workspace(
        r#"
[[chain]]
name = "Build"
[[chain.task]]
cmd = "true"

[[chain]]
name = "Ship"
[[chain.task]]
cmd = "false"
"#,
    );

    let err = taskchain::run(args).await.unwrap_err();
    assert!(err.to_string().contains("1 task(s) failed"), "{err:?}");
}

#[tokio::test]
async fn final_error_behind_a_burst_of_events_is_counted() {
    let (_dir, args) = workspace(
        r#"
[[chain]]
name = "Fight"
[[chain.task]]
cmd = """
i=0
while [ $i -lt 3000 ]; do
  echo '::event {"kind": "stage-drop-report", "payload": {"stage": "1-7", "drops": [{"itemId": "30011", "quantity": 1}]}}'
  i=$((i + 1))
done
"""

[[chain]]
name = "Ship"
[[chain.task]]
cmd = "false"
"#,
    );

    let err = taskchain::run(args).await.unwrap_err();
    assert!(err.to_string().contains("1 task(s) failed"), "{err:?}");
}

#[tokio::test]
async fn capture_failure_aborts_the_run() {
    let (_dir, args) = workspace(
        r#"
[[chain]]
name = "Fight"
[[chain.task]]
cmd = """
echo '::event {"kind": "capture-image-empty"}'
sleep 30
"""
[[chain.task]]
cmd = "true"
"#,
    );

    let err = taskchain::run(args).await.unwrap_err();
    assert!(err.to_string().contains("capture failed"), "{err:?}");
}

#[tokio::test]
async fn unknown_target_is_rejected_before_anything_runs() {
    let (dir, mut args) = workspace(
        r#"
[[chain]]
name = "Build"
[[chain.task]]
cmd = "touch {dir}/ran"
"#,
    );
    args.binding = TargetBinding {
        target: Some("Nowhere".to_string()),
        ..TargetBinding::default()
    };

    let err = taskchain::run(args).await.unwrap_err();
    match err.downcast_ref::<TaskchainError>() {
        Some(TaskchainError::UnknownTarget(name)) => assert_eq!(name, "Nowhere"),
        other => panic!("expected UnknownTarget, got {other:?}"),
    }
    assert!(!dir.path().join("ran").exists());
}

#[tokio::test]
async fn dry_run_executes_nothing() {
    let (dir, mut args) = workspace(
        r#"
[[chain]]
name = "Build"
[[chain.task]]
cmd = "touch {dir}/ran"
"#,
    );
    args.dry_run = true;

    taskchain::run(args).await.unwrap();
    assert!(!dir.path().join("ran").exists());
}
