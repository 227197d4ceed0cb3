use crate::config::{Config, ConfigStore};
use crate::handler::Handler;
use crate::speech::Speak;
use std::path::Path;
use std::sync::Arc;

/// Everything a plugin may capture while registering its handlers.
#[derive(Clone)]
pub struct PluginContext {
    pub config: Arc<ConfigStore>,
    pub speaker: Arc<dyn Speak>,
}

impl PluginContext {
    pub fn new(config: Arc<ConfigStore>, speaker: Arc<dyn Speak>) -> Self {
        Self { config, speaker }
    }

    pub fn config(&self) -> Config {
        self.config.snapshot()
    }

    pub fn config_path(&self) -> &Path {
        self.config.path()
    }
}

/// Keyword to handler pairs contributed by one plugin, in declaration order.
#[derive(Default)]
pub struct Registration {
    entries: Vec<(String, Arc<dyn Handler>)>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the same handler to every keyword in `keywords`.
    pub fn with(mut self, keywords: &[&str], handler: Arc<dyn Handler>) -> Self {
        for keyword in keywords {
            self.entries.push((keyword.to_string(), Arc::clone(&handler)));
        }
        self
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(String, Arc<dyn Handler>)> {
        self.entries
    }
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn register(&self, ctx: &PluginContext) -> Registration;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    #[test]
    fn test_registration_aliases_share_handler() {
        let handler = handler_fn(|_| Ok("pong".to_string()));
        let registration = Registration::new()
            .with(&["ping", "pong"], Arc::clone(&handler))
            .with(&["echo"], handler_fn(|args| Ok(args.raw)));

        assert_eq!(registration.len(), 3);
        assert_eq!(
            registration.keywords().collect::<Vec<_>>(),
            vec!["ping", "pong", "echo"]
        );

        let entries = registration.into_entries();
        assert!(Arc::ptr_eq(&entries[0].1, &entries[1].1));
        assert!(!Arc::ptr_eq(&entries[0].1, &entries[2].1));
    }

    #[test]
    fn test_empty_registration() {
        let registration = Registration::new();
        assert!(registration.is_empty());
        assert_eq!(registration.keywords().count(), 0);
    }
}
