// src/engine/orchestrator.rs

//! Public entry point: owns the worker and dispatch threads.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::intercept::{Interception, Interceptor};
use super::lifecycle::{Lifecycle, SchedulerState};
use super::messages::{dispatch_loop, MessageQueue, Observer};
use super::reporter::Reporter;
use super::worker::worker_loop;
use crate::capture::Controller;
use crate::config::CUSTOM_TARGET;
use crate::errors::{Result, TaskchainError};
use crate::resource::ResourceProvider;
use crate::task::{CancelFlag, Task};
use crate::types::{ConnectType, MessageKind};

/// State shared by the API, the worker loop and every [`Reporter`].
pub(crate) struct Shared {
    state: Mutex<SchedulerState>,
    wake: Condvar,
    cancel: CancelFlag,
    messages: MessageQueue,
    interceptor: Interceptor,
    resource: Arc<dyn ResourceProvider>,
    controller: Mutex<Box<dyn Controller>>,
}

impl Shared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until notified (start, append-driven wake, stop or shutdown).
    pub(crate) fn wait<'a>(
        &self,
        state: MutexGuard<'a, SchedulerState>,
    ) -> MutexGuard<'a, SchedulerState> {
        self.wake.wait(state).unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep until `deadline` unless the scheduler stops running first.
    pub(crate) fn pace<'a>(
        &self,
        state: MutexGuard<'a, SchedulerState>,
        deadline: Instant,
    ) -> MutexGuard<'a, SchedulerState> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return state;
        }
        match self
            .wake
            .wait_timeout_while(state, remaining, |s| s.is_running())
        {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }

    pub(crate) fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub(crate) fn task_delay(&self) -> Duration {
        self.resource.task_delay()
    }

    /// Intercept an event and queue it for the observer.
    pub(crate) fn post(&self, kind: MessageKind, payload: Value) {
        let Interception { payload, stop } = self.interceptor.intercept(kind, payload);
        if stop {
            self.stop();
        }
        self.messages.post(kind, payload);
    }

    /// Locking stop: lifecycle to idle, queue discarded, template cache
    /// cleared once the lock is released.
    pub(crate) fn stop(&self) -> bool {
        let discarded = {
            let mut state = self.lock_state();
            let discarded = state.stop();
            self.wake.notify_all();
            discarded
        };
        if !discarded.is_empty() {
            debug!(discarded = discarded.len(), "dropping unexecuted tasks");
        }
        drop(discarded);

        self.resource.clear_template_cache();
        true
    }

    fn lock_controller(&self) -> MutexGuard<'_, Box<dyn Controller>> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sequential task runner with asynchronous status delivery.
///
/// - Tasks are appended (only once a capture target is bound) and run in
///   append order on a dedicated worker thread after [`start`](Self::start).
/// - Outcomes are posted as messages and delivered to the observer on a
///   separate dispatch thread, so a slow observer never blocks scheduling.
/// - [`stop`](Self::stop) discards queued tasks and raises the cancel flag
///   of the running one; it never kills it.
///
/// Dropping the orchestrator shuts both threads down and joins them.
pub struct Orchestrator {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("lifecycle", &self.lifecycle())
            .field("queued", &self.queued())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Load resources and spawn the worker and dispatch threads.
    ///
    /// If `resource.load()` fails the observer (when present) receives
    /// `init-failed` synchronously, and the error is returned either way.
    pub fn new(
        resource: Arc<dyn ResourceProvider>,
        controller: Box<dyn Controller>,
        observer: Option<Box<dyn Observer>>,
    ) -> Result<Self> {
        if let Err(err) = resource.load() {
            let what = err.to_string();
            error!(error = %what, "resource broken");
            if let Some(mut observer) = observer {
                let detail = json!({ "type": "resource broken", "what": what });
                observer.on_message(MessageKind::InitFailed, &detail);
            }
            return Err(TaskchainError::InitFailed(what));
        }

        let cancel = CancelFlag::new(true);
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState::new(cancel.clone())),
            wake: Condvar::new(),
            cancel,
            messages: MessageQueue::new(),
            interceptor: Interceptor::new(Arc::clone(&resource)),
            resource,
            controller: Mutex::new(controller),
        });

        // Built before spawning so an early return still joins what started.
        let mut orchestrator = Self {
            shared,
            worker: None,
            dispatcher: None,
        };

        let worker_shared = Arc::clone(&orchestrator.shared);
        orchestrator.worker = Some(
            thread::Builder::new()
                .name("taskchain-worker".to_string())
                .spawn(move || worker_loop(worker_shared))?,
        );

        let dispatch_shared = Arc::clone(&orchestrator.shared);
        orchestrator.dispatcher = Some(
            thread::Builder::new()
                .name("taskchain-dispatch".to_string())
                .spawn(move || dispatch_loop(&dispatch_shared.messages, observer))?,
        );

        info!("orchestrator ready");
        Ok(orchestrator)
    }

    /// Bind a capture target from the resource's target list.
    ///
    /// With `Some(name)` only that target is tried; with `None` every
    /// non-custom target is tried in order until one binds. Stops any
    /// current run first.
    pub fn catch_target(&self, name: Option<&str>) -> bool {
        self.stop();

        let targets = self.shared.resource.targets();
        let bound = {
            let mut controller = self.shared.lock_controller();
            match name {
                Some(name) => match targets.iter().find(|t| t.name == name) {
                    Some(target) => controller.try_capture(target, false),
                    None => {
                        warn!(target_name = %name, "unknown capture target");
                        false
                    }
                },
                None => targets
                    .iter()
                    .filter(|t| t.name != CUSTOM_TARGET)
                    .any(|t| controller.try_capture(t, false)),
            }
        };

        self.set_initialized(bound)
    }

    /// Bind the `Custom` target in custom mode.
    pub fn catch_custom(&self) -> bool {
        self.stop();

        let target = self
            .shared
            .resource
            .targets()
            .into_iter()
            .find(|t| t.name == CUSTOM_TARGET);
        let bound = match target {
            Some(target) => self.shared.lock_controller().try_capture(&target, true),
            None => {
                warn!("no [target.{CUSTOM_TARGET}] configured");
                false
            }
        };

        self.set_initialized(bound)
    }

    /// Bind according to the resource's `connect_type`.
    pub fn catch_default(&self) -> bool {
        match self.shared.resource.connect_type() {
            ConnectType::Emulator => self.catch_target(None),
            ConnectType::Custom => self.catch_custom(),
        }
    }

    /// Mark the orchestrator as bound without touching any device.
    pub fn catch_fake(&self) -> bool {
        self.stop();
        self.set_initialized(true)
    }

    fn set_initialized(&self, bound: bool) -> bool {
        self.shared.lock_state().set_initialized(bound);
        info!(bound, "capture binding updated");
        bound
    }

    /// Queue one task. `false` (queue untouched) before a target is bound.
    pub fn append(&self, task: Box<dyn Task>) -> bool {
        let mut state = self.shared.lock_state();
        let appended = state.append(task);
        if appended {
            self.shared.wake.notify_all();
        }
        appended
    }

    /// Queue several tasks under one lock so no other append interleaves.
    ///
    /// All-or-nothing: `false` and nothing queued before a target is bound.
    pub fn append_chain(&self, tasks: Vec<Box<dyn Task>>) -> bool {
        let mut state = self.shared.lock_state();
        Self::append_locked(&mut state, tasks)
    }

    /// Queue several tasks and start, under one lock acquisition.
    ///
    /// Returns the result of the start: `false` if nothing could be queued
    /// or the scheduler was already running (the tasks are still queued and
    /// will run in that case).
    pub fn append_and_start(&self, tasks: Vec<Box<dyn Task>>) -> bool {
        let mut state = self.shared.lock_state();
        if !Self::append_locked(&mut state, tasks) {
            return false;
        }
        let started = state.start();
        self.shared.wake.notify_all();
        started
    }

    fn append_locked(state: &mut SchedulerState, tasks: Vec<Box<dyn Task>>) -> bool {
        if !state.initialized() || state.is_shutting_down() {
            debug!(tasks = tasks.len(), "append refused: no target bound or shutting down");
            return false;
        }
        tasks.into_iter().all(|task| state.append(task))
    }

    /// Start running queued tasks. `false` if already running or no target
    /// is bound.
    pub fn start(&self) -> bool {
        let mut state = self.shared.lock_state();
        let started = state.start();
        if started {
            self.shared.wake.notify_all();
        }
        started
    }

    /// Stop after the current task; discard everything still queued and
    /// clear the template cache. Always `true`.
    pub fn stop(&self) -> bool {
        self.shared.stop()
    }

    /// Post an event as if a task had reported it.
    pub fn reporter(&self) -> Reporter {
        Reporter::new(Arc::clone(&self.shared))
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lock_state().lifecycle()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle() == Lifecycle::Running
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.lock_state().initialized()
    }

    /// Number of tasks waiting to run (excludes the one running).
    pub fn queued(&self) -> usize {
        self.shared.lock_state().queue().len()
    }

    /// Labels of the waiting tasks, front first.
    pub fn queued_chains(&self) -> Vec<String> {
        self.shared
            .lock_state()
            .queue()
            .chains()
            .map(str::to_string)
            .collect()
    }

    /// Messages posted but not yet handed to the observer.
    pub fn pending_messages(&self) -> usize {
        self.shared.messages.len()
    }

    /// Stop both loops and join their threads. Idempotent; also run on drop.
    ///
    /// The dispatch loop delivers every message already posted before it
    /// exits. A task that ignores its cancel flag delays the join.
    pub fn shutdown(&mut self) {
        if self.worker.is_none() && self.dispatcher.is_none() {
            return;
        }

        {
            let mut state = self.shared.lock_state();
            state.shutdown();
            self.shared.wake.notify_all();
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("worker thread panicked");
            }
        }

        // Closed only after the worker is gone so its last events get out.
        self.shared.messages.close();
        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.join().is_err() {
                error!("dispatch thread panicked");
            }
        }

        info!("orchestrator shut down");
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
