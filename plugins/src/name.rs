use async_trait::async_trait;
use shared::config::ConfigStore;
use shared::handler::{CommandArgs, Handler, HandlerResult};
use shared::plugin::{Plugin, PluginContext, Registration};
use shared::speech::Speak;
use std::sync::Arc;
use tracing::info;

pub struct NamePlugin;

impl Plugin for NamePlugin {
    fn name(&self) -> &'static str {
        "name"
    }

    fn register(&self, ctx: &PluginContext) -> Registration {
        let handler = NameHandler {
            config: Arc::clone(&ctx.config),
            speaker: Arc::clone(&ctx.speaker),
        };
        Registration::new().with(&["name", "setname"], Arc::new(handler))
    }
}

/// Reports the assistant's name, or stores a new one in the config file.
/// The new name is used from the next start.
pub struct NameHandler {
    config: Arc<ConfigStore>,
    speaker: Arc<dyn Speak>,
}

#[async_trait]
impl Handler for NameHandler {
    async fn handle(&self, args: CommandArgs) -> HandlerResult {
        if args.is_empty() {
            let current = self.config.snapshot().assistant.name;
            return Ok(format!("My current name is {}.", current));
        }

        let new_name = args.joined();
        if let Err(e) = self
            .config
            .update(|config| config.assistant.name = new_name.clone())
        {
            return Ok(format!("Error saving new name: {}", e));
        }
        info!("Assistant renamed to {}", new_name);

        self.speaker
            .speak(&format!("My name has been changed to {}.", new_name))
            .await;
        Ok(format!("Name updated to {}.", new_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSpeaker;
    use shared::config::{load_config, Config};
    use tempfile::TempDir;

    fn handler(store: ConfigStore) -> (NameHandler, Arc<ConfigStore>, Arc<RecordingSpeaker>) {
        let store = Arc::new(store);
        let speaker = RecordingSpeaker::new();
        let handler = NameHandler {
            config: Arc::clone(&store),
            speaker: speaker.clone(),
        };
        (handler, store, speaker)
    }

    #[tokio::test]
    async fn test_reports_current_name() {
        let (handler, _, speaker) = handler(ConfigStore::new("unused.toml", Config::default()));

        let response = handler.handle(CommandArgs::default()).await.unwrap();
        assert_eq!(response, "My current name is duck.");
        assert!(speaker.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_rename_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let (handler, store, speaker) = handler(ConfigStore::new(&path, Config::default()));

        let response = handler
            .handle(CommandArgs::from_text("mister duck"))
            .await
            .unwrap();

        assert_eq!(response, "Name updated to mister duck.");
        assert_eq!(speaker.spoken(), vec!["My name has been changed to mister duck."]);
        assert_eq!(store.snapshot().assistant.name, "mister duck");
        assert_eq!(load_config(&path).unwrap().assistant.name, "mister duck");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_old_name() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be written as a file.
        let (handler, store, speaker) = handler(ConfigStore::new(dir.path(), Config::default()));

        let response = handler.handle(CommandArgs::from_text("goose")).await.unwrap();

        assert!(response.starts_with("Error saving new name: "));
        assert!(speaker.spoken().is_empty());
        assert_eq!(store.snapshot().assistant.name, "duck");
    }
}
