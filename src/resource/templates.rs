// src/resource/templates.rs

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Screen region where a template was last matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Cache of template name -> last matched region.
///
/// Recognisers consult it to narrow their search; `clear` resets recognition
/// to a clean state (done on every stop).
#[derive(Debug, Default)]
pub struct TemplateCache {
    regions: Mutex<HashMap<String, MatchRegion>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&self, template: &str, region: MatchRegion) {
        self.lock().insert(template.to_string(), region);
    }

    pub fn lookup(&self, template: &str) -> Option<MatchRegion> {
        self.lock().get(template).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MatchRegion>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
