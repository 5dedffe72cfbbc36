// tests/stop_and_capture_failures.rs

mod common;
use crate::common::{
    bound_harness, executed, execution_log, wait_until, FakeTask, MemoryResource, WAIT,
};

use std::time::Duration;

use serde_json::json;
use taskchain::engine::Lifecycle;
use taskchain::types::MessageKind;

#[test]
fn stop_is_idempotent_and_clears_the_template_cache_each_time() {
    let (orch, _observer, resource) = bound_harness(MemoryResource::new());
    // `catch_fake` stops once while binding.
    let baseline = resource.clear_count();

    assert!(orch.stop());
    assert!(orch.stop());

    assert_eq!(resource.clear_count(), baseline + 2);
    assert_eq!(orch.lifecycle(), Lifecycle::Idle);
    assert_eq!(orch.queued(), 0);
}

#[test]
fn stop_discards_queued_tasks_and_cancels_the_running_one() {
    let (orch, observer, _) = bound_harness(MemoryResource::new());
    let log = execution_log();

    assert!(orch.append_and_start(vec![
        FakeTask::new("A", &log).named("running").until_cancelled().boxed(),
        FakeTask::new("A", &log).named("queued-1").boxed(),
        FakeTask::new("B", &log).named("queued-2").boxed(),
    ]));
    assert!(wait_until(WAIT, || executed(&log).len() == 1));

    assert!(orch.stop());
    assert_eq!(orch.queued(), 0);
    assert!(!orch.is_running());

    assert!(observer.wait_for(MessageKind::TaskError, WAIT));
    // Give the worker a moment; nothing else may run.
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(executed(&log), vec!["running"]);
    assert_eq!(observer.kinds(), vec![MessageKind::TaskError]);
}

#[test]
fn scheduler_can_be_restarted_after_stop() {
    let (orch, observer, _) = bound_harness(MemoryResource::new());
    let log = execution_log();

    assert!(orch.append(FakeTask::new("A", &log).named("dropped").boxed()));
    assert!(orch.stop());
    assert_eq!(orch.queued(), 0);

    assert!(orch.append_and_start(vec![FakeTask::new("B", &log).named("kept").boxed()]));
    assert!(observer.wait_for(MessageKind::AllTasksCompleted, WAIT));
    assert_eq!(executed(&log), vec!["kept"]);
}

#[test]
fn capture_pointer_null_stops_the_run_before_delivery() {
    let (orch, observer, resource) = bound_harness(MemoryResource::new());
    let baseline = resource.clear_count();
    let log = execution_log();

    assert!(orch.append_and_start(vec![
        FakeTask::new("Fight", &log)
            .named("broken")
            .reporting(MessageKind::CapturePointerNull, json!({"what": "screencap"}))
            .boxed(),
        FakeTask::new("Fight", &log).named("never").boxed(),
        FakeTask::new("Mall", &log).named("never-either").boxed(),
    ]));

    assert!(observer.wait_for(MessageKind::CapturePointerNull, WAIT));
    // By the time the observer sees the failure the run is already stopped.
    assert_eq!(orch.queued(), 0);
    assert!(!orch.is_running());
    assert!(resource.clear_count() > baseline);

    assert!(wait_until(WAIT, || orch.lifecycle() == Lifecycle::Idle));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(executed(&log), vec!["broken"]);

    // The interrupted task itself still finished successfully, against an
    // emptied queue.
    assert!(observer.wait_for(MessageKind::AllTasksCompleted, WAIT));
    let msgs = observer.messages();
    assert_eq!(msgs[0].payload, json!({"what": "screencap"}));
    assert_eq!(
        observer.kinds(),
        vec![
            MessageKind::CapturePointerNull,
            MessageKind::TaskChainCompleted,
            MessageKind::AllTasksCompleted,
        ]
    );
}

#[test]
fn capture_image_empty_also_stops_the_run() {
    let (orch, observer, _) = bound_harness(MemoryResource::new());
    let log = execution_log();

    assert!(orch.append_and_start(vec![
        FakeTask::new("Fight", &log)
            .reporting(MessageKind::CaptureImageEmpty, json!({}))
            .boxed(),
        FakeTask::new("Fight", &log).named("never").boxed(),
    ]));

    assert!(observer.wait_for(MessageKind::CaptureImageEmpty, WAIT));
    assert_eq!(orch.queued(), 0);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(executed(&log), vec!["Fight"]);
}

#[test]
fn capture_failure_reported_from_outside_a_task_stops_too() {
    let (orch, observer, _) = bound_harness(MemoryResource::new());
    let log = execution_log();

    assert!(orch.append(FakeTask::new("A", &log).boxed()));
    orch.reporter()
        .report(MessageKind::CaptureImageEmpty, json!({"source": "watchdog"}));

    assert_eq!(orch.queued(), 0);
    assert!(observer.wait_for(MessageKind::CaptureImageEmpty, WAIT));
}
