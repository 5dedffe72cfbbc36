//! In-memory stand-ins for the orchestrator's collaborators.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use taskchain::capture::{Controller, TargetInfo};
use taskchain::engine::{Message, Observer, Reporter};
use taskchain::errors::{Result, TaskchainError};
use taskchain::resource::ResourceProvider;
use taskchain::task::{CancelFlag, Task};
use taskchain::types::{ConnectType, MessageKind};

/// Shared record of which fake tasks ran, in order.
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

pub fn execution_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn executed(log: &ExecutionLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A task that:
/// - appends its name to an [`ExecutionLog`] when it starts
/// - reports any configured events
/// - then succeeds, fails, panics, or waits for cancellation.
pub struct FakeTask {
    chain: String,
    name: String,
    log: ExecutionLog,
    succeed: bool,
    panics: bool,
    events: Vec<(MessageKind, Value)>,
    hold: Option<Duration>,
    wait_for_cancel: bool,
    cancel: CancelFlag,
}

impl FakeTask {
    pub fn new(chain: &str, log: &ExecutionLog) -> Self {
        Self {
            chain: chain.to_string(),
            name: chain.to_string(),
            log: Arc::clone(log),
            succeed: true,
            panics: false,
            events: Vec::new(),
            hold: None,
            wait_for_cancel: false,
            cancel: CancelFlag::default(),
        }
    }

    /// Name written to the log (defaults to the chain label).
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.succeed = false;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn reporting(mut self, kind: MessageKind, payload: Value) -> Self {
        self.events.push((kind, payload));
        self
    }

    /// Sleep for `d` before finishing.
    pub fn holding(mut self, d: Duration) -> Self {
        self.hold = Some(d);
        self
    }

    /// Block until the cancel flag is raised (capped at 10s), then fail.
    pub fn until_cancelled(mut self) -> Self {
        self.wait_for_cancel = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Task> {
        Box::new(self)
    }
}

impl Task for FakeTask {
    fn chain(&self) -> &str {
        &self.chain
    }

    fn bind_cancel(&mut self, flag: CancelFlag) {
        self.cancel = flag;
    }

    fn run(&mut self, reporter: &Reporter) -> bool {
        self.log.lock().unwrap().push(self.name.clone());

        for (kind, payload) in self.events.drain(..) {
            reporter.report(kind, payload);
        }

        if let Some(d) = self.hold {
            thread::sleep(d);
        }

        if self.wait_for_cancel {
            let deadline = Instant::now() + Duration::from_secs(10);
            while !self.cancel.is_cancelled() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            return false;
        }

        if self.panics {
            panic!("fake task '{}' panicked", self.name);
        }

        self.succeed
    }
}

/// Controller that records every bind attempt and accepts a fixed set of
/// target names. Clones share the record.
#[derive(Clone, Default)]
pub struct FakeController {
    accept: Option<HashSet<String>>,
    attempts: Arc<Mutex<Vec<(String, bool)>>>,
}

impl FakeController {
    /// Accepts every target.
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn accepting(names: &[&str]) -> Self {
        Self {
            accept: Some(names.iter().map(|n| n.to_string()).collect()),
            attempts: Arc::default(),
        }
    }

    pub fn rejecting_all() -> Self {
        Self::accepting(&[])
    }

    /// `(target name, custom)` for every attempt so far.
    pub fn attempts(&self) -> Vec<(String, bool)> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn boxed(&self) -> Box<dyn Controller> {
        Box::new(self.clone())
    }
}

impl Controller for FakeController {
    fn try_capture(&mut self, target: &TargetInfo, custom: bool) -> bool {
        self.attempts
            .lock()
            .unwrap()
            .push((target.name.clone(), custom));
        match self.accept {
            Some(ref names) => names.contains(&target.name),
            None => true,
        }
    }
}

/// Resource provider held entirely in memory, with zero task delay by
/// default and a counter of template-cache clears.
#[derive(Default)]
pub struct MemoryResource {
    items: BTreeMap<String, String>,
    targets: Vec<TargetInfo>,
    connect_type: ConnectType,
    task_delay: Duration,
    load_error: Option<String>,
    clears: AtomicUsize,
    drops: Mutex<BTreeMap<String, i64>>,
}

impl MemoryResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, id: &str, name: &str) -> Self {
        self.items.insert(id.to_string(), name.to_string());
        self
    }

    pub fn with_target(mut self, name: &str) -> Self {
        self.targets.push(TargetInfo {
            name: name.to_string(),
            connect: format!("connect {name}"),
            address: None,
        });
        self
    }

    pub fn with_connect_type(mut self, connect_type: ConnectType) -> Self {
        self.connect_type = connect_type;
        self
    }

    pub fn with_task_delay(mut self, delay: Duration) -> Self {
        self.task_delay = delay;
        self
    }

    /// `load` fails with a configuration error carrying `what`.
    pub fn failing_load(mut self, what: &str) -> Self {
        self.load_error = Some(what.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl ResourceProvider for MemoryResource {
    fn load(&self) -> Result<()> {
        match self.load_error {
            Some(ref what) => Err(TaskchainError::ConfigError(what.clone())),
            None => Ok(()),
        }
    }

    fn clear_template_cache(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn increase_drop_count(&self, item_id: &str, quantity: i64) {
        let mut drops = self.drops.lock().unwrap();
        let count = drops.entry(item_id.to_string()).or_insert(0);
        *count = count.saturating_add(quantity);
    }

    fn item_name(&self, item_id: &str) -> Option<String> {
        self.items.get(item_id).cloned()
    }

    fn drop_counts(&self) -> Vec<(String, i64)> {
        self.drops
            .lock()
            .unwrap()
            .iter()
            .map(|(id, count)| (id.clone(), *count))
            .collect()
    }

    fn task_delay(&self) -> Duration {
        self.task_delay
    }

    fn connect_type(&self) -> ConnectType {
        self.connect_type
    }

    fn targets(&self) -> Vec<TargetInfo> {
        self.targets.clone()
    }
}

/// Observer that records every delivered message. Clones share the record,
/// so keep one clone and hand the other to the orchestrator.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    inner: Arc<(Mutex<Vec<Message>>, Condvar)>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn Observer> {
        Box::new(self.clone())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.0.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<MessageKind> {
        self.messages().into_iter().map(|m| m.kind).collect()
    }

    pub fn of_kind(&self, kind: MessageKind) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.payload)
            .collect()
    }

    /// Block until a message of `kind` has been delivered.
    pub fn wait_for(&self, kind: MessageKind, timeout: Duration) -> bool {
        self.wait_while(timeout, |msgs| !msgs.iter().any(|m| m.kind == kind))
    }

    /// Block until at least `n` messages have been delivered.
    pub fn wait_for_count(&self, n: usize, timeout: Duration) -> bool {
        self.wait_while(timeout, |msgs| msgs.len() < n)
    }

    fn wait_while(&self, timeout: Duration, cond: impl FnMut(&mut Vec<Message>) -> bool) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap();
        let (_guard, result) = cvar.wait_timeout_while(guard, timeout, cond).unwrap();
        !result.timed_out()
    }
}

impl Observer for RecordingObserver {
    fn on_message(&mut self, kind: MessageKind, payload: &Value) {
        let (lock, cvar) = &*self.inner;
        lock.lock().unwrap().push(Message {
            kind,
            payload: payload.clone(),
        });
        cvar.notify_all();
    }
}
