// tests/capture_binding.rs

mod common;
use crate::common::{
    execution_log, init_tracing, FakeController, FakeTask, MemoryResource, RecordingObserver,
};

use std::sync::Arc;

use taskchain::cli::TargetBinding;
use taskchain::engine::Orchestrator;
use taskchain::types::ConnectType;

fn orchestrator(resource: MemoryResource, controller: &FakeController) -> Orchestrator {
    init_tracing();
    Orchestrator::new(
        Arc::new(resource),
        controller.boxed(),
        Some(RecordingObserver::new().boxed()),
    )
    .unwrap()
}

fn targets() -> MemoryResource {
    MemoryResource::new()
        .with_target("Custom")
        .with_target("Local")
        .with_target("Remote")
}

#[test]
fn catch_target_by_name_tries_only_that_target() {
    let controller = FakeController::accept_all();
    let orch = orchestrator(targets(), &controller);

    assert!(orch.catch_target(Some("Remote")));
    assert!(orch.is_initialized());
    assert_eq!(controller.attempts(), vec![("Remote".to_string(), false)]);
}

#[test]
fn catch_target_with_unknown_name_fails_without_attempts() {
    let controller = FakeController::accept_all();
    let orch = orchestrator(targets(), &controller);

    assert!(!orch.catch_target(Some("Nowhere")));
    assert!(!orch.is_initialized());
    assert!(controller.attempts().is_empty());
}

#[test]
fn catch_target_without_name_skips_custom_and_stops_at_first_success() {
    let controller = FakeController::accepting(&["Local", "Remote"]);
    let orch = orchestrator(targets(), &controller);

    assert!(orch.catch_target(None));
    assert_eq!(controller.attempts(), vec![("Local".to_string(), false)]);
}

#[test]
fn catch_target_without_name_fails_when_every_target_rejects() {
    let controller = FakeController::rejecting_all();
    let orch = orchestrator(targets(), &controller);

    assert!(!orch.catch_target(None));
    assert_eq!(
        controller.attempts(),
        vec![("Local".to_string(), false), ("Remote".to_string(), false)]
    );
}

#[test]
fn catch_custom_binds_custom_target_in_custom_mode() {
    let controller = FakeController::accept_all();
    let orch = orchestrator(targets(), &controller);

    assert!(orch.catch_custom());
    assert_eq!(controller.attempts(), vec![("Custom".to_string(), true)]);
}

#[test]
fn catch_custom_without_custom_target_fails() {
    let controller = FakeController::accept_all();
    let orch = orchestrator(MemoryResource::new().with_target("Local"), &controller);

    assert!(!orch.catch_custom());
    assert!(controller.attempts().is_empty());
}

#[test]
fn catch_default_follows_connect_type() {
    let controller = FakeController::accept_all();
    let orch = orchestrator(targets().with_connect_type(ConnectType::Custom), &controller);
    assert!(orch.catch_default());
    assert_eq!(controller.attempts(), vec![("Custom".to_string(), true)]);

    let controller = FakeController::accept_all();
    let orch = orchestrator(targets(), &controller);
    assert!(orch.catch_default());
    assert_eq!(controller.attempts(), vec![("Local".to_string(), false)]);
}

#[test]
fn catch_fake_binds_without_touching_the_controller() {
    let controller = FakeController::rejecting_all();
    let orch = orchestrator(MemoryResource::new(), &controller);

    assert!(orch.catch_fake());
    assert!(orch.is_initialized());
    assert!(controller.attempts().is_empty());
}

#[test]
fn failed_rebind_clears_initialized_and_queue() {
    let controller = FakeController::accepting(&["Local"]);
    let orch = orchestrator(targets(), &controller);
    let log = execution_log();

    assert!(orch.catch_target(Some("Local")));
    assert!(orch.append(FakeTask::new("A", &log).boxed()));

    assert!(!orch.catch_target(Some("Remote")));
    assert!(!orch.is_initialized());
    assert_eq!(orch.queued(), 0);
    assert!(!orch.append(FakeTask::new("A", &log).boxed()));
}

#[test]
fn cli_binding_selects_the_matching_catch() {
    let controller = FakeController::accept_all();
    let orch = orchestrator(targets(), &controller);

    let fake = TargetBinding {
        target: None,
        custom: false,
        fake: true,
    };
    assert!(taskchain::bind(&orch, &fake));
    assert!(controller.attempts().is_empty());

    let named = TargetBinding {
        target: Some("Remote".to_string()),
        custom: false,
        fake: false,
    };
    assert!(taskchain::bind(&orch, &named));

    let custom = TargetBinding {
        target: None,
        custom: true,
        fake: false,
    };
    assert!(taskchain::bind(&orch, &custom));

    let default = TargetBinding {
        target: None,
        custom: false,
        fake: false,
    };
    assert!(taskchain::bind(&orch, &default));

    assert_eq!(
        controller.attempts(),
        vec![
            ("Remote".to_string(), false),
            ("Custom".to_string(), true),
            ("Local".to_string(), false),
        ]
    );
}
