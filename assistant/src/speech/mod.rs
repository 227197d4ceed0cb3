pub mod system;

pub use system::SystemVoice;

use async_trait::async_trait;
use shared::config::TtsConfig;
use shared::speech::Speak;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub id: String,
    pub name: String,
    pub languages: Vec<String>,
}

/// A text-to-speech backend.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn voices(&self) -> Vec<VoiceProfile>;

    fn set_voice(&mut self, id: &str);

    /// Speaking rate in words per minute.
    fn set_rate(&mut self, rate: u32);

    /// Resolves once the utterance has finished playing.
    async fn synthesize(&self, text: &str) -> anyhow::Result<()>;
}

/// First voice whose primary language tag mentions English, else the first
/// voice on offer.
pub fn select_voice(voices: &[VoiceProfile]) -> Option<&VoiceProfile> {
    voices
        .iter()
        .find(|v| {
            v.languages
                .first()
                .is_some_and(|lang| lang.to_lowercase().contains("en"))
        })
        .or_else(|| voices.first())
}

/// Rounds a configured rate to whole words per minute. Non-positive and
/// non-finite rates are rejected.
pub fn words_per_minute(rate: f64) -> Option<u32> {
    if !rate.is_finite() || rate < 1.0 {
        return None;
    }
    Some(rate.round().min(f64::from(u32::MAX)) as u32)
}

/// Serializes all spoken output behind one lock.
///
/// A caller holds the lock from the start of synthesis until the engine
/// reports completion, so a timer firing mid-response waits its turn instead
/// of talking over it.
pub struct SpeechGate {
    name: String,
    engine: Box<dyn SpeechEngine>,
    lock: Mutex<()>,
}

impl SpeechGate {
    pub fn new<E>(name: impl Into<String>, mut engine: E, config: &TtsConfig) -> Self
    where
        E: SpeechEngine + 'static,
    {
        if let Some(rate) = config.rate {
            match words_per_minute(rate) {
                Some(wpm) => engine.set_rate(wpm),
                None => warn!("Ignoring speech rate {}, keeping the engine default", rate),
            }
        }

        let voices = engine.voices();
        match select_voice(&voices) {
            Some(voice) => {
                info!("Selected voice '{}' ({})", voice.name, voice.id);
                let id = voice.id.clone();
                engine.set_voice(&id);
            }
            None => warn!("No voices exposed by the speech engine, keeping its default"),
        }

        Self {
            name: name.into(),
            engine: Box::new(engine),
            lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Speak for SpeechGate {
    async fn speak(&self, text: &str) {
        println!("[{}]: {}", self.name, text);

        let _guard = self.lock.lock().await;
        debug!("Speech lock acquired");
        if let Err(e) = self.engine.synthesize(text).await {
            error!("Speech synthesis failed: {}", e);
        }
    }
}
