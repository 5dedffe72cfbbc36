#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use taskchain::engine::Orchestrator;
pub use taskchain_test_utils::fakes::{
    executed, execution_log, ExecutionLog, FakeController, FakeTask, MemoryResource,
    RecordingObserver,
};
pub use taskchain_test_utils::{builders, init_tracing, wait_until};

/// Upper bound for anything the tests wait on.
pub const WAIT: Duration = Duration::from_secs(5);

/// An orchestrator over `resource`, bound with `catch_fake`, plus the
/// observer and resource handles.
pub fn bound_harness(
    resource: MemoryResource,
) -> (Orchestrator, RecordingObserver, Arc<MemoryResource>) {
    init_tracing();
    let resource = resource.shared();
    let observer = RecordingObserver::new();
    let orchestrator = Orchestrator::new(
        resource.clone(),
        FakeController::accept_all().boxed(),
        Some(observer.boxed()),
    )
    .expect("orchestrator should initialise");
    assert!(orchestrator.catch_fake());
    (orchestrator, observer, resource)
}
