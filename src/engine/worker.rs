// src/engine/worker.rs

//! The worker loop: runs queued tasks one at a time.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::orchestrator::Shared;
use super::queue::{QueuedTask, TaskQueue};
use super::reporter::Reporter;
use crate::task::Task;
use crate::types::MessageKind;

/// Run until shutdown.
///
/// Each iteration, under the state lock: take the next task if running,
/// otherwise settle idle and sleep on the condvar. The task itself runs with
/// the lock released; completion events are derived under the lock (so the
/// lookahead sees a consistent queue) and posted after releasing it.
pub(crate) fn worker_loop(shared: Arc<Shared>) {
    info!("worker loop started");

    let reporter = Reporter::new(Arc::clone(&shared));
    let mut state = shared.lock_state();

    while !state.is_shutting_down() {
        let Some(QueuedTask { chain, mut task }) = state.take_next() else {
            state.settle_idle();
            state = shared.wait(state);
            continue;
        };

        let started = Instant::now();
        task.bind_cancel(shared.cancel_flag());
        drop(state);

        let success = run_guarded(task.as_mut(), &chain, &reporter);
        drop(task);

        state = shared.lock_state();
        let events = completion_events(&chain, success, state.queue());
        if state.queue().is_empty() {
            state.settle_idle();
        }
        drop(state);

        for (kind, payload) in events {
            shared.post(kind, payload);
        }

        let deadline = started + shared.task_delay();
        state = shared.pace(shared.lock_state(), deadline);
    }

    info!("worker loop finished");
}

/// Run `task`, converting a panic into a failure so the loop survives.
fn run_guarded(task: &mut dyn Task, chain: &str, reporter: &Reporter) -> bool {
    debug!(chain = %chain, "running task");

    match panic::catch_unwind(AssertUnwindSafe(|| task.run(reporter))) {
        Ok(success) => {
            debug!(chain = %chain, success, "task finished");
            success
        }
        Err(panic) => {
            error!(
                chain = %chain,
                panic = %panic_message(panic.as_ref()),
                "task panicked; treating as failure"
            );
            false
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Events raised after a task of `chain` finished, given what is left in
/// the queue.
///
/// - success: `task-chain-completed` when the chain ended (queue empty or
///   next label differs), then `all-tasks-completed` when the queue is empty;
/// - failure: `task-error`; the remaining queue still runs.
pub(crate) fn completion_events(
    chain: &str,
    success: bool,
    queue: &TaskQueue,
) -> Vec<(MessageKind, Value)> {
    let detail = json!({ "task_chain": chain });

    if !success {
        return vec![(MessageKind::TaskError, detail)];
    }

    let mut events = Vec::new();
    if queue.chain_ends_after(chain) {
        events.push((MessageKind::TaskChainCompleted, detail));
    }
    if queue.is_empty() {
        events.push((MessageKind::AllTasksCompleted, Value::Null));
    }
    events
}
