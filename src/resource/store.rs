// src/resource/store.rs

//! Directory-backed resource store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info};

use super::templates::TemplateCache;
use super::ResourceProvider;
use crate::capture::TargetInfo;
use crate::config::{load_resource_config, OptionsSection, ResourceConfig};
use crate::errors::Result;
use crate::types::ConnectType;

/// Resource collaborator backed by `<dir>/resource.toml`.
///
/// Before [`ResourceProvider::load`] succeeds the store answers with default
/// options, no targets and no item names. Drop totals live for the lifetime
/// of the value and are never persisted.
#[derive(Debug)]
pub struct Resource {
    dir: Option<PathBuf>,
    config: RwLock<Option<ResourceConfig>>,
    templates: TemplateCache,
    drops: Mutex<BTreeMap<String, i64>>,
}

impl Resource {
    /// A store that reads `resource.toml` from `dir` on `load`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
            config: RwLock::new(None),
            templates: TemplateCache::new(),
            drops: Mutex::new(BTreeMap::new()),
        }
    }

    /// A store around an already validated config; `load` is a no-op.
    pub fn from_config(config: ResourceConfig) -> Self {
        Self {
            dir: None,
            config: RwLock::new(Some(config)),
            templates: TemplateCache::new(),
            drops: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    fn with_config<T>(&self, f: impl FnOnce(Option<&ResourceConfig>) -> T) -> T {
        let guard = self.config.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }

    fn options(&self) -> OptionsSection {
        self.with_config(|cfg| cfg.map(|c| c.options.clone()).unwrap_or_default())
    }
}

impl ResourceProvider for Resource {
    fn load(&self) -> Result<()> {
        let Some(ref dir) = self.dir else {
            return Ok(());
        };

        let config = load_resource_config(dir)?;
        info!(
            dir = %dir.display(),
            targets = config.target.len(),
            items = config.item.len(),
            task_delay_ms = config.options.task_delay_ms,
            "resource loaded"
        );

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
        Ok(())
    }

    fn clear_template_cache(&self) {
        debug!(cached = self.templates.len(), "clearing template cache");
        self.templates.clear();
    }

    fn increase_drop_count(&self, item_id: &str, quantity: i64) {
        let mut drops = self.drops.lock().unwrap_or_else(PoisonError::into_inner);
        let count = drops.entry(item_id.to_string()).or_insert(0);
        *count = count.saturating_add(quantity);
    }

    fn item_name(&self, item_id: &str) -> Option<String> {
        self.with_config(|cfg| cfg.and_then(|c| c.item.get(item_id).cloned()))
    }

    fn drop_counts(&self) -> Vec<(String, i64)> {
        let drops = self.drops.lock().unwrap_or_else(PoisonError::into_inner);
        drops.iter().map(|(id, count)| (id.clone(), *count)).collect()
    }

    fn task_delay(&self) -> Duration {
        self.options().task_delay()
    }

    fn connect_type(&self) -> ConnectType {
        self.options().connect_type
    }

    fn targets(&self) -> Vec<TargetInfo> {
        self.with_config(|cfg| {
            cfg.map(|c| {
                c.target
                    .iter()
                    .map(|(name, t)| TargetInfo::from_config(name, t))
                    .collect()
            })
            .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resource_file_path, RawResourceConfig};
    use crate::resource::MatchRegion;

    fn write_resource(dir: &Path, contents: &str) {
        std::fs::write(resource_file_path(dir), contents).unwrap();
    }

    #[test]
    fn load_reads_options_targets_and_items() {
        let dir = tempfile::tempdir().unwrap();
        write_resource(
            dir.path(),
            r#"
[options]
task_delay_ms = 25
connect_type = "emulator"

[target.Beta]
connect = "true"

[target.Alpha]
connect = "true"
address = "127.0.0.1:5555"

[item]
"30011" = "Orirock"
"#,
        );

        let res = Resource::new(dir.path());
        assert_eq!(res.item_name("30011"), None);

        res.load().unwrap();
        assert_eq!(res.task_delay(), Duration::from_millis(25));
        assert_eq!(res.item_name("30011").as_deref(), Some("Orirock"));
        assert_eq!(res.item_name("99999"), None);

        let names: Vec<_> = res.targets().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn load_failure_leaves_defaults_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let res = Resource::new(dir.path());
        assert!(res.load().is_err());
        assert_eq!(res.task_delay(), Duration::from_millis(500));
        assert!(res.targets().is_empty());
    }

    #[test]
    fn drop_counts_accumulate_in_id_order() {
        let res = Resource::from_config(ResourceConfig::try_from(RawResourceConfig::default()).unwrap());
        res.increase_drop_count("30012", 1);
        res.increase_drop_count("30011", 3);
        res.increase_drop_count("30012", 2);

        assert_eq!(
            res.drop_counts(),
            vec![("30011".to_string(), 3), ("30012".to_string(), 3)]
        );
    }

    #[test]
    fn drop_counts_saturate_instead_of_overflowing() {
        let res = Resource::from_config(ResourceConfig::try_from(RawResourceConfig::default()).unwrap());
        res.increase_drop_count("30011", i64::MAX);
        res.increase_drop_count("30011", i64::MAX);

        assert_eq!(res.drop_counts(), vec![("30011".to_string(), i64::MAX)]);
    }

    #[test]
    fn clear_template_cache_empties_templates() {
        let res = Resource::from_config(ResourceConfig::try_from(RawResourceConfig::default()).unwrap());
        res.templates().remember(
            "SanityBegin",
            MatchRegion {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
        );
        res.clear_template_cache();
        assert!(res.templates().is_empty());
    }
}
