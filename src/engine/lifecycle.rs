// src/engine/lifecycle.rs

//! Scheduler state guarded by the orchestrator's state mutex.
//!
//! Every method here expects the caller to already hold that mutex (they
//! take `&mut self`, which is only reachable through the guard). The public
//! `Orchestrator::{start, stop}` entry points lock and then delegate here;
//! code that already holds the guard (the worker loop, `append_and_start`)
//! calls these directly.

use tracing::{debug, info};

use super::queue::{QueuedTask, TaskQueue};
use crate::task::{CancelFlag, Task};

/// Whether work may proceed.
///
/// Legal moves: `Idle -> Running` (start), `Running -> Idle` (stop or the
/// queue draining), and anything `-> ShuttingDown`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    ShuttingDown,
}

#[derive(Debug)]
pub struct SchedulerState {
    lifecycle: Lifecycle,
    initialized: bool,
    queue: TaskQueue,
    cancel: CancelFlag,
}

impl SchedulerState {
    pub fn new(cancel: CancelFlag) -> Self {
        cancel.set(true);
        Self {
            lifecycle: Lifecycle::Idle,
            initialized: false,
            queue: TaskQueue::new(),
            cancel,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lifecycle == Lifecycle::ShuttingDown
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Queue `task` at the tail. Refused before a capture target is bound
    /// and once shutdown has begun.
    pub fn append(&mut self, task: Box<dyn Task>) -> bool {
        if !self.initialized || self.is_shutting_down() {
            debug!(chain = %task.chain(), "append refused: no target bound or shutting down");
            return false;
        }
        self.queue.push(task);
        true
    }

    /// `Idle -> Running`. Returns `false` when already running, shutting
    /// down, or no target is bound.
    pub fn start(&mut self) -> bool {
        if !self.initialized {
            debug!("start refused: not initialized");
            return false;
        }
        match self.lifecycle {
            Lifecycle::Idle => {
                self.lifecycle = Lifecycle::Running;
                self.cancel.set(false);
                info!(queued = self.queue.len(), "scheduler started");
                true
            }
            Lifecycle::Running => {
                debug!("start refused: already running");
                false
            }
            Lifecycle::ShuttingDown => false,
        }
    }

    /// `Running -> Idle` and discard every queued task.
    ///
    /// Returns the discarded records so the caller can drop them after the
    /// lock is released.
    pub fn stop(&mut self) -> Vec<QueuedTask> {
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Idle;
        }
        self.cancel.set(true);

        let discarded = self.queue.drain();
        info!(discarded = discarded.len(), "scheduler stopped");
        discarded
    }

    /// Natural completion: `Running -> Idle` once nothing is left to run.
    ///
    /// Returns `true` if this call changed the lifecycle.
    pub fn settle_idle(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }
        self.lifecycle = Lifecycle::Idle;
        self.cancel.set(true);
        debug!("scheduler idle");
        true
    }

    /// Enter the terminal state.
    pub fn shutdown(&mut self) {
        self.lifecycle = Lifecycle::ShuttingDown;
        self.cancel.set(true);
    }

    /// Pop the next task if the scheduler is running.
    pub fn take_next(&mut self) -> Option<QueuedTask> {
        if !self.is_running() {
            return None;
        }
        self.queue.pop_front()
    }
}
