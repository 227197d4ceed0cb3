//! Built-in command plugins.
//!
//! Each plugin turns the shared [`PluginContext`](shared::plugin::PluginContext)
//! into a set of keyword bindings. Order matters: when two plugins claim the
//! same keyword, the one registered later answers it.

pub mod launcher;
pub mod music;
pub mod name;
pub mod numbers;
pub mod screenshot;
pub mod time;
pub mod timer;
pub mod weather;
pub mod website;
pub mod wikipedia;

use shared::plugin::Plugin;

/// Every built-in plugin in registration order.
pub fn builtin() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(music::MusicPlugin),
        Box::new(name::NamePlugin),
        Box::new(screenshot::ScreenshotPlugin),
        Box::new(website::WebsitePlugin),
        Box::new(time::TimePlugin),
        Box::new(timer::TimerPlugin),
        Box::new(weather::WeatherPlugin),
        Box::new(wikipedia::WikipediaPlugin),
    ]
}
