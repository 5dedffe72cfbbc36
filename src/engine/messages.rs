// src/engine/messages.rs

//! Outbound message queue and the dispatch loop that drains it.
//!
//! The queue has its own mutex and condvar, never the scheduler's, so a slow
//! observer cannot hold up task execution. The dispatch loop pops under the
//! lock and calls the observer with the lock released.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, error, info, trace};

use super::worker::panic_message;
use crate::types::MessageKind;

/// One status event on its way to the observer.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub payload: Value,
}

/// Receiver of status messages.
///
/// Called only from the dispatch thread, one message at a time, with no
/// orchestrator lock held. It may call back into the orchestrator.
pub trait Observer: Send {
    fn on_message(&mut self, kind: MessageKind, payload: &Value);
}

impl<F> Observer for F
where
    F: FnMut(MessageKind, &Value) + Send,
{
    fn on_message(&mut self, kind: MessageKind, payload: &Value) {
        self(kind, payload)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<Message>,
    closed: bool,
}

/// Unbounded FIFO of messages with a wake-up condvar.
#[derive(Debug, Default)]
pub struct MessageQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and wake the dispatch loop. Never fails; posts after
    /// `close` are still delivered if the loop has not exited yet.
    pub fn post(&self, kind: MessageKind, payload: Value) {
        let mut state = self.lock();
        trace!(%kind, depth = state.messages.len(), "message queued");
        state.messages.push_back(Message { kind, payload });
        self.ready.notify_one();
    }

    /// Ask the dispatch loop to exit once the queue is drained.
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until a message is available. `None` once closed and empty.
    pub fn next(&self) -> Option<Message> {
        let mut state = self.lock();
        loop {
            if let Some(msg) = state.messages.pop_front() {
                return Some(msg);
            }
            if state.closed {
                return None;
            }
            state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deliver messages to `observer` until the queue is closed and drained.
///
/// Without an observer the messages are consumed and discarded.
pub fn dispatch_loop(queue: &MessageQueue, mut observer: Option<Box<dyn Observer>>) {
    info!(has_observer = observer.is_some(), "dispatch loop started");

    while let Some(msg) = queue.next() {
        match observer.as_mut() {
            Some(obs) => {
                debug!(kind = %msg.kind, "delivering message");
                let delivered =
                    panic::catch_unwind(AssertUnwindSafe(|| obs.on_message(msg.kind, &msg.payload)));
                if let Err(panic) = delivered {
                    error!(
                        kind = %msg.kind,
                        panic = %panic_message(panic.as_ref()),
                        "observer panicked; message dropped"
                    );
                }
            }
            None => trace!(kind = %msg.kind, "no observer; message discarded"),
        }
    }

    info!("dispatch loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn next_returns_none_after_close_and_drain() {
        let q = MessageQueue::new();
        q.post(MessageKind::TaskError, json!({"task_chain": "A"}));
        q.close();
        assert_eq!(q.next().map(|m| m.kind), Some(MessageKind::TaskError));
        assert_eq!(q.next(), None);
    }

    #[test]
    fn dispatch_preserves_post_order_across_threads() {
        let q = Arc::new(MessageQueue::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let q = Arc::clone(&q);
            let seen = Arc::clone(&seen);
            let observer = move |_kind: MessageKind, payload: &Value| {
                seen.lock().unwrap().push(payload["n"].as_i64().unwrap());
            };
            thread::spawn(move || dispatch_loop(&q, Some(Box::new(observer))))
        };

        for n in 0..100 {
            q.post(MessageKind::TaskChainCompleted, json!({ "n": n }));
        }
        q.close();
        handle.join().unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn observer_panic_does_not_end_dispatch() {
        let q = MessageQueue::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let seen = Arc::clone(&seen);
            move |kind: MessageKind, _payload: &Value| {
                if kind == MessageKind::TaskError {
                    panic!("observer failed on {kind}");
                }
                seen.lock().unwrap().push(kind);
            }
        };

        q.post(MessageKind::TaskError, json!({"task_chain": "A"}));
        q.post(MessageKind::TaskChainCompleted, json!({"task_chain": "B"}));
        q.post(MessageKind::AllTasksCompleted, Value::Null);
        q.close();
        dispatch_loop(&q, Some(Box::new(observer)));

        assert!(q.is_empty());
        assert_eq!(
            seen.lock().unwrap().clone(),
            vec![MessageKind::TaskChainCompleted, MessageKind::AllTasksCompleted]
        );
    }

    #[test]
    fn dispatch_without_observer_drains_queue() {
        let q = MessageQueue::new();
        q.post(MessageKind::AllTasksCompleted, Value::Null);
        q.close();
        dispatch_loop(&q, None);
        assert!(q.is_empty());
    }
}
