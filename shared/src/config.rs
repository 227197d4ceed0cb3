use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("stt.model_path not set in config")]
    MissingModelPath,

    #[error("No config directory available on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub stt: SttConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    /// Plugin sections, kept opaque until a plugin asks for one.
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AssistantConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub wake_words: Vec<String>,
    #[serde(default = "default_wake_threshold")]
    pub wake_threshold: f64,
    #[serde(default)]
    pub fuzzy_commands: bool,
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: u8,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            wake_words: Vec::new(),
            wake_threshold: default_wake_threshold(),
            fuzzy_commands: false,
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

impl AssistantConfig {
    /// Lower-cased wake phrases; the assistant's own name when none are set.
    pub fn wake_phrases(&self) -> Vec<String> {
        if self.wake_words.is_empty() {
            return vec![self.name.to_lowercase()];
        }
        self.wake_words.iter().map(|w| w.to_lowercase()).collect()
    }
}

fn default_name() -> String {
    "duck".to_string()
}

fn default_wake_threshold() -> f64 {
    60.0
}

fn default_fuzzy_threshold() -> u8 {
    70
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct TtsConfig {
    /// Words per minute; integer or float in the file.
    #[serde(default)]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct SttConfig {
    #[serde(default)]
    pub model_path: Option<String>,
}

impl SttConfig {
    pub fn require_model_path(&self) -> Result<&Path, ConfigError> {
        match self.model_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(Path::new(path)),
            _ => Err(ConfigError::MissingModelPath),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_size: default_frame_size(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_frame_size() -> usize {
    4000
}

fn default_buffer_capacity() -> usize {
    100
}

impl Config {
    /// Deserializes the top-level table `key` for a plugin.
    ///
    /// A missing table yields `T::default()`; so does a malformed one, with a
    /// warning, so one bad plugin section cannot stop the assistant.
    pub fn section<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.extra.get(key) {
            None => T::default(),
            Some(value) => value.clone().try_into().unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed [{}] section: {}", key, e);
                T::default()
            }),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("Config file not found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    tracing::info!("Loading config from {:?}", path);
    let config_str = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_str)?;

    tracing::info!("Config loaded successfully");
    Ok(config)
}

pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let config_str = toml::to_string_pretty(config)?;
    std::fs::write(path, config_str)?;
    tracing::debug!("Config written to {:?}", path);
    Ok(())
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("echoduck").join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

/// The configuration document together with the file it came from.
///
/// Writes go to disk first; the in-memory copy changes only once the file
/// has been replaced.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    inner: RwLock<Config>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            inner: RwLock::new(config),
        }
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_config(&path)?;
        Ok(Self::new(path, config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Config {
        self.read().clone()
    }

    pub fn update<F>(&self, apply: F) -> Result<Config, ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        let mut guard = self.write();
        let mut next = guard.clone();
        apply(&mut next);
        save_config(&self.path, &next)?;
        *guard = next.clone();
        Ok(next)
    }

    fn read(&self) -> RwLockReadGuard<'_, Config> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Config> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct WeatherSection {
        #[serde(default)]
        apikey: String,
        #[serde(default)]
        units: String,
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.assistant.name, "duck");
        assert!(config.assistant.wake_words.is_empty());
        assert_eq!(config.assistant.wake_threshold, 60.0);
        assert!(!config.assistant.fuzzy_commands);
        assert_eq!(config.assistant.fuzzy_threshold, 70);

        assert_eq!(config.tts.rate, None);
        assert_eq!(config.stt.model_path, None);

        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.frame_size, 4000);
        assert_eq!(config.audio.buffer_capacity, 100);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_config_with_custom_values() {
        let toml_str = r#"
            [assistant]
            name = "Echo"
            wake_words = ["Hey Echo", "echo"]

            [tts]
            rate = 180

            [stt]
            model_path = "/models/vosk-small-en"

            [audio]
            frame_size = 2000
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.assistant.name, "Echo");
        assert_eq!(config.assistant.wake_phrases(), vec!["hey echo", "echo"]);
        assert_eq!(config.tts.rate, Some(180.0));
        assert_eq!(
            config.stt.model_path.as_deref(),
            Some("/models/vosk-small-en")
        );
        assert_eq!(config.audio.frame_size, 2000);
        assert_eq!(config.audio.sample_rate, 16000);
    }

    #[test]
    fn test_config_with_missing_fields_uses_defaults() {
        let toml_str = r#"
            [assistant]
            name = "Quackers"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.assistant.wake_threshold, 60.0);
        assert_eq!(config.assistant.wake_phrases(), vec!["quackers"]);
        assert_eq!(config.audio, AudioConfig::default());
    }

    #[test]
    fn test_numeric_keys_accept_floats() {
        let toml_str = r#"
            [assistant]
            wake_threshold = 0.6

            [tts]
            rate = 150.0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.assistant.wake_threshold, 0.6);
        assert_eq!(config.tts.rate, Some(150.0));
    }

    #[test]
    fn test_config_with_invalid_types() {
        let toml_str = r#"
            [audio]
            sample_rate = "not_a_number"
        "#;
        let result: Result<Config, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_plugin_sections_are_kept_opaque() {
        let toml_str = r#"
            [weather]
            apikey = "abc123"
            units = "imperial"

            [music]
            folder = "/home/duck/Music"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();

        assert!(config.extra.contains_key("weather"));
        assert!(config.extra.contains_key("music"));

        let weather: WeatherSection = config.section("weather");
        assert_eq!(weather.apikey, "abc123");
        assert_eq!(weather.units, "imperial");
    }

    #[test]
    fn test_missing_or_malformed_section_defaults() {
        let toml_str = r#"
            weather = 5
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();

        let malformed: WeatherSection = config.section("weather");
        assert_eq!(malformed, WeatherSection::default());

        let missing: WeatherSection = config.section("nothing_here");
        assert_eq!(missing, WeatherSection::default());
    }

    #[test]
    fn test_require_model_path() {
        let mut stt = SttConfig::default();
        assert!(matches!(
            stt.require_model_path(),
            Err(ConfigError::MissingModelPath)
        ));

        stt.model_path = Some("   ".to_string());
        assert!(stt.require_model_path().is_err());

        stt.model_path = Some("/models/en".to_string());
        assert_eq!(stt.require_model_path().unwrap(), Path::new("/models/en"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_store_update_writes_file_and_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut music = toml::Table::new();
        music.insert(
            "folder".to_string(),
            toml::Value::String("/music".to_string()),
        );
        let mut initial = Config::default();
        initial
            .extra
            .insert("music".to_string(), toml::Value::Table(music));
        let store = ConfigStore::new(&path, initial);

        let updated = store
            .update(|c| c.assistant.name = "Mallard".to_string())
            .unwrap();

        assert_eq!(updated.assistant.name, "Mallard");
        assert_eq!(store.snapshot().assistant.name, "Mallard");

        let reloaded = load_config(&path).unwrap();
        assert_eq!(reloaded.assistant.name, "Mallard");
        assert!(reloaded.extra.contains_key("music"));
    }

    #[test]
    fn test_store_failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is a directory, so the write fails.
        let store = ConfigStore::new(dir.path(), Config::default());

        let result = store.update(|c| c.assistant.name = "Broken".to_string());

        assert!(matches!(result, Err(ConfigError::Io(_))));
        assert_eq!(store.snapshot().assistant.name, "duck");
    }

    #[test]
    fn test_store_load_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[assistant]\nname = \"Drake\"\n\n[stt]\nmodel_path = \"/m\"\n",
        )
        .unwrap();

        let store = ConfigStore::load(&path).unwrap();

        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.snapshot().assistant.name, "Drake");
        assert_eq!(store.snapshot().stt.model_path.as_deref(), Some("/m"));
    }
}
