// src/engine/mod.rs

//! Scheduling core.
//!
//! This module ties together:
//! - the task queue and its chain lookahead ([`queue`])
//! - the lifecycle state machine guarded by the state mutex ([`lifecycle`])
//! - the worker loop that runs one task at a time ([`worker`])
//! - the outbound message queue and dispatch loop ([`messages`])
//! - the interceptor applied to every event before it is queued
//!   ([`intercept`])
//! - the public [`Orchestrator`] that owns both threads ([`orchestrator`])
//!
//! Two locks exist and are never nested: the state mutex (queue + lifecycle,
//! with the condvar the worker sleeps on) and the message queue's own mutex.
//! Neither is held while calling into a task, the observer, or the capture
//! and resource collaborators.

pub mod intercept;
pub mod lifecycle;
pub mod messages;
pub mod orchestrator;
pub mod queue;
pub mod reporter;
pub mod worker;

pub use intercept::{Interception, Interceptor, UNKNOWN_ITEM_NAME};
pub use lifecycle::{Lifecycle, SchedulerState};
pub use messages::{dispatch_loop, Message, MessageQueue, Observer};
pub use orchestrator::Orchestrator;
pub use queue::{QueuedTask, TaskQueue};
pub use reporter::Reporter;
