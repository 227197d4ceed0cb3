pub mod config;
pub mod handler;
pub mod plugin;
pub mod speech;

pub use config::{Config, ConfigError, ConfigStore};
pub use handler::{CommandArgs, Handler, HandlerError, HandlerResult};
pub use plugin::{Plugin, PluginContext, Registration};
pub use speech::Speak;
