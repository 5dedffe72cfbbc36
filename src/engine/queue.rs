// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::task::Task;

/// A queued task together with the chain label captured at append time.
#[derive(Debug)]
pub struct QueuedTask {
    pub chain: String,
    pub task: Box<dyn Task>,
}

impl QueuedTask {
    pub fn new(task: Box<dyn Task>) -> Self {
        Self {
            chain: task.chain().to_string(),
            task,
        }
    }
}

/// FIFO of pending tasks.
///
/// Chains are implicit: a chain is a contiguous run of records with the same
/// label, and "this chain just finished" is decided by comparing the label
/// of the task that ran with the label now at the front
/// ([`TaskQueue::chain_ends_after`]). The queue itself is not synchronised;
/// it lives inside the scheduler state behind the orchestrator's mutex.
#[derive(Debug, Default)]
pub struct TaskQueue {
    items: VecDeque<QueuedTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Box<dyn Task>) {
        let record = QueuedTask::new(task);
        debug!(chain = %record.chain, position = self.items.len(), "task appended");
        self.items.push_back(record);
    }

    pub fn pop_front(&mut self) -> Option<QueuedTask> {
        self.items.pop_front()
    }

    pub fn front_chain(&self) -> Option<&str> {
        self.items.front().map(|t| t.chain.as_str())
    }

    /// Whether a task of `chain` that was just popped closed its chain:
    /// the queue is empty, or the next task belongs to a different chain.
    pub fn chain_ends_after(&self, chain: &str) -> bool {
        self.front_chain() != Some(chain)
    }

    /// Swap the queue for an empty one, returning the discarded tasks.
    pub fn drain(&mut self) -> Vec<QueuedTask> {
        std::mem::take(&mut self.items).into()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Labels of queued tasks, front first.
    pub fn chains(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|t| t.chain.as_str())
    }
}
