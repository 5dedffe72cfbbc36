// src/engine/reporter.rs

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::orchestrator::Shared;
use crate::types::MessageKind;

/// Handle through which tasks (and other collaborators) raise status events.
///
/// Every event passes through the interceptor before it is queued, so a
/// capture failure reported here stops the scheduler before `report`
/// returns. Cheap to clone and safe to move to helper threads.
#[derive(Clone)]
pub struct Reporter {
    shared: Arc<Shared>,
}

impl Reporter {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn report(&self, kind: MessageKind, payload: Value) {
        self.shared.post(kind, payload);
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}
