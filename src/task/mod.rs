// src/task/mod.rs

//! Runnable tasks.
//!
//! The scheduler treats every task uniformly through the [`Task`] trait:
//! a chain label, a cooperative cancellation flag bound before the first
//! run, and a blocking `run` that reports success or failure. Concrete
//! automation behaviours live outside the core; [`command::CommandTask`]
//! is the shell-backed variant used by the binary.

pub mod command;

pub use command::CommandTask;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::Reporter;

/// A unit of work executed on the worker thread.
pub trait Task: Send {
    /// Label of the chain this task belongs to. Consecutive tasks with the
    /// same label form one chain.
    fn chain(&self) -> &str;

    /// Receive the live cancellation flag. Called right before `run`.
    fn bind_cancel(&mut self, flag: CancelFlag);

    /// Run to completion. Long-running tasks should poll their
    /// [`CancelFlag`] at safe points and give up when it is set.
    ///
    /// Status events (capture failures, drop reports) go through `reporter`.
    fn run(&mut self, reporter: &Reporter) -> bool;
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("chain", &self.chain())
            .finish_non_exhaustive()
    }
}

/// Shared cooperative cancellation signal.
///
/// Set whenever the scheduler leaves the running state (stop, natural
/// completion, shutdown) and cleared by `start`.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new(cancelled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(cancelled)))
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, cancelled: bool) {
        self.0.store(cancelled, Ordering::Release);
    }
}
