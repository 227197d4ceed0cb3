//! Plays a track from `[music] folder` with the default audio player.

use crate::launcher;
use rand::seq::SliceRandom;
use serde::Deserialize;
use shared::config::ConfigStore;
use shared::handler::{handler_fn, CommandArgs, HandlerResult};
use shared::plugin::{Plugin, PluginContext, Registration};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicSettings {
    #[serde(default)]
    pub folder: String,
}

pub struct MusicPlugin;

impl Plugin for MusicPlugin {
    fn name(&self) -> &'static str {
        "music"
    }

    fn register(&self, ctx: &PluginContext) -> Registration {
        let config = Arc::clone(&ctx.config);
        Registration::new().with(
            &["play", "music", "playmusic"],
            handler_fn(move |args| play(&config, &args)),
        )
    }
}

fn play(config: &ConfigStore, args: &CommandArgs) -> HandlerResult {
    let settings: MusicSettings = config.snapshot().section("music");
    let track = match select_track(Path::new(&settings.folder), args) {
        Ok(track) => track,
        Err(message) => return Ok(message),
    };

    let track_name = track
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Err(e) = launcher::open(&track.to_string_lossy()) {
        return Ok(format!("Error launching '{}': {}", track_name, e));
    }
    Ok(format!("Started playing {}", track_name))
}

/// `.mp3` files directly inside `folder`, sorted by name.
pub fn list_tracks(folder: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot read music folder {:?}: {}", folder, e);
            return Vec::new();
        }
    };

    let mut tracks: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
        })
        .collect();
    tracks.sort();
    tracks
}

/// The first track whose name contains the spoken words, or a random one
/// when nothing was asked for. `Err` carries the sentence to speak.
pub fn select_track(folder: &Path, args: &CommandArgs) -> Result<PathBuf, String> {
    let tracks = list_tracks(folder);

    if !args.is_empty() {
        let query = args.joined().to_lowercase();
        return tracks
            .into_iter()
            .find(|track| {
                track
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().to_lowercase().contains(&query))
            })
            .ok_or_else(|| format!("No track found matching '{}'.", query));
    }

    tracks
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| "No music files found in folder.".to_string())
}
