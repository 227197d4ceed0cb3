use indexmap::IndexMap;
use shared::handler::Handler;
use shared::plugin::{Plugin, PluginContext, Registration};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct RegistryEntry {
    pub keyword: String,
    pub plugin: String,
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("keyword", &self.keyword)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

/// A keyword claimed by a later registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overwrite {
    pub keyword: String,
    pub previous: String,
    pub replacement: String,
}

/// Collects plugin registrations. The last registration of a keyword wins,
/// keeping the keyword's original position; every overwrite is recorded.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: IndexMap<String, RegistryEntry>,
    overwrites: Vec<Overwrite>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        plugin: &str,
        keyword: &str,
        handler: Arc<dyn Handler>,
    ) -> Option<Overwrite> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            warn!("Plugin '{}' registered an empty keyword, ignoring", plugin);
            return None;
        }

        let entry = RegistryEntry {
            keyword: keyword.clone(),
            plugin: plugin.to_string(),
            handler,
        };

        let previous = self.entries.insert(keyword.clone(), entry)?;
        let overwrite = Overwrite {
            keyword,
            previous: previous.plugin,
            replacement: plugin.to_string(),
        };
        warn!(
            "Keyword '{}' from plugin '{}' overwritten by plugin '{}'",
            overwrite.keyword, overwrite.previous, overwrite.replacement
        );
        self.overwrites.push(overwrite.clone());
        Some(overwrite)
    }

    pub fn add_registration(&mut self, plugin: &str, registration: Registration) {
        for (keyword, handler) in registration.into_entries() {
            self.insert(plugin, &keyword, handler);
        }
    }

    pub fn add_plugin(&mut self, plugin: &dyn Plugin, ctx: &PluginContext) {
        let registration = plugin.register(ctx);
        debug!(
            "Plugin '{}' registered {} keyword(s)",
            plugin.name(),
            registration.len()
        );
        self.add_registration(plugin.name(), registration);
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            entries: self.entries,
            overwrites: self.overwrites,
        }
    }
}

/// Immutable keyword to handler map, complete before any recognizer exists.
pub struct HandlerRegistry {
    entries: IndexMap<String, RegistryEntry>,
    overwrites: Vec<Overwrite>,
}

impl HandlerRegistry {
    pub fn from_plugins(plugins: &[Box<dyn Plugin>], ctx: &PluginContext) -> Self {
        let mut builder = RegistryBuilder::new();
        for plugin in plugins {
            builder.add_plugin(plugin.as_ref(), ctx);
        }
        let registry = builder.build();
        info!(
            "Registered {} command keyword(s) from {} plugin(s)",
            registry.len(),
            plugins.len()
        );
        registry
    }

    /// Exact lookup of an already normalized keyword.
    pub fn get(&self, keyword: &str) -> Option<&RegistryEntry> {
        self.entries.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    /// Plugin currently answering `keyword`.
    pub fn owner(&self, keyword: &str) -> Option<&str> {
        self.entries.get(keyword).map(|e| e.plugin.as_str())
    }

    /// Lower-cased keywords in registration order.
    pub fn keywords(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn overwrites(&self) -> &[Overwrite] {
        &self.overwrites
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
