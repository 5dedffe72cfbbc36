// src/engine/intercept.rs

//! Interception of status events before they are queued for dispatch.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, trace, warn};

use crate::resource::ResourceProvider;
use crate::types::MessageKind;

/// Name used for item ids missing from the item table.
pub const UNKNOWN_ITEM_NAME: &str = "unknown material";

/// Result of intercepting one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Interception {
    /// Payload to queue (possibly rewritten).
    pub payload: Value,
    /// The run must be stopped before the event is queued.
    pub stop: bool,
}

/// Applied to every event on its way to the message queue.
///
/// - capture failures request a stop;
/// - stage drop reports update the drop accumulator and gain item names plus
///   a `statistics` array;
/// - everything else passes through.
pub struct Interceptor {
    resource: Arc<dyn ResourceProvider>,
}

impl Interceptor {
    pub fn new(resource: Arc<dyn ResourceProvider>) -> Self {
        Self { resource }
    }

    pub fn intercept(&self, kind: MessageKind, payload: Value) -> Interception {
        match kind {
            k if k.is_capture_failure() => {
                warn!(kind = %k, "capture failure reported; stopping run");
                Interception {
                    payload,
                    stop: true,
                }
            }
            MessageKind::StageDropReport => Interception {
                payload: self.organize_stage_drop(payload),
                stop: false,
            },
            _ => Interception {
                payload,
                stop: false,
            },
        }
    }

    /// Account the drops in `report` and annotate it.
    ///
    /// Input: `{"drops": [{"itemId": "30011", "quantity": 3}, ...], ...}`.
    /// Every drop gains `itemName`; the result gains `statistics`, one
    /// `{itemId, itemName, count}` per item seen this session, highest count
    /// first (ties keep accumulator order).
    pub fn organize_stage_drop(&self, report: Value) -> Value {
        let mut dst = match report {
            Value::Object(map) => map,
            other => {
                warn!(payload = %other, "stage drop report is not an object; replacing");
                Map::new()
            }
        };

        if let Some(drops) = dst.get_mut("drops").and_then(Value::as_array_mut) {
            for drop in drops.iter_mut() {
                self.account_drop(drop);
            }
        }

        let mut statistics: Vec<(String, i64)> = self.resource.drop_counts();
        // `sort_by` is stable, so equal counts stay in accumulator order.
        statistics.sort_by(|lhs, rhs| rhs.1.cmp(&lhs.1));

        let statistics: Vec<Value> = statistics
            .into_iter()
            .map(|(id, count)| {
                json!({
                    "itemId": id,
                    "itemName": self.display_name(&id),
                    "count": count,
                })
            })
            .collect();

        dst.insert("statistics".to_string(), Value::Array(statistics));

        let dst = Value::Object(dst);
        trace!(report = %dst, "organized stage drop");
        dst
    }

    fn account_drop(&self, drop: &mut Value) {
        let id = match drop.get("itemId") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                warn!(drop = %drop, "drop entry without itemId; skipped");
                return;
            }
        };
        let Some(quantity) = drop
            .get("quantity")
            .and_then(Value::as_i64)
            .filter(|q| *q > 0)
        else {
            warn!(drop = %drop, "drop entry without positive integer quantity; skipped");
            return;
        };

        self.resource.increase_drop_count(&id, quantity);
        debug!(item = %id, quantity, "drop accounted");

        if let Some(entry) = drop.as_object_mut() {
            entry.insert("itemName".to_string(), Value::String(self.display_name(&id)));
        }
    }

    fn display_name(&self, id: &str) -> String {
        self.resource
            .item_name(id)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string())
    }
}
