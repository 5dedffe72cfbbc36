// src/resource/mod.rs

//! Resource collaborator.
//!
//! The orchestrator needs a handful of things from the resource layer:
//! loading (fatal on failure), template-cache invalidation on stop, drop
//! accounting for stage reports, the inter-task delay, and the capture
//! targets. [`ResourceProvider`] is that seam; [`Resource`] is the
//! directory-backed implementation used by the binary.

pub mod store;
pub mod templates;

pub use store::Resource;
pub use templates::{MatchRegion, TemplateCache};

use std::time::Duration;

use crate::capture::TargetInfo;
use crate::errors::Result;
use crate::types::ConnectType;

/// Everything the orchestrator consumes from the resource layer.
///
/// Implementations must be shareable between the API caller, the worker
/// thread and any reporter handed to running tasks.
pub trait ResourceProvider: Send + Sync {
    /// Load assets. Called once while constructing the orchestrator; an
    /// error makes construction fail.
    fn load(&self) -> Result<()> {
        Ok(())
    }

    /// Forget every previously matched screen region.
    fn clear_template_cache(&self);

    /// Add `quantity` to the session total for `item_id`.
    fn increase_drop_count(&self, item_id: &str, quantity: i64);

    /// Human-readable name for `item_id`, if known.
    fn item_name(&self, item_id: &str) -> Option<String>;

    /// Session totals in accumulator iteration order.
    fn drop_counts(&self) -> Vec<(String, i64)>;

    /// Pacing floor between the starts of two consecutive tasks.
    fn task_delay(&self) -> Duration;

    fn connect_type(&self) -> ConnectType {
        ConnectType::default()
    }

    /// Configured capture targets, in the order they should be tried.
    fn targets(&self) -> Vec<TargetInfo> {
        Vec::new()
    }
}
