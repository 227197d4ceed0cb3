#[cfg(feature = "vosk")]
pub mod vosk;

use crate::audio::frames::AudioSource;
use crate::registry::HandlerRegistry;
use crate::resolver::EXIT_KEYWORDS;
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// A speech decoder with its own utterance state.
pub trait Decoder: Send {
    /// Feeds one frame. Returns the utterance text once the decoder has
    /// finalized it; the text may be empty if nothing was understood.
    fn accept(&mut self, frame: &[i16]) -> Result<Option<String>>;

    /// Discards any partially decoded utterance.
    fn reset(&mut self);
}

/// The three listening phases of a dispatch cycle.
#[async_trait]
pub trait Listener: Send {
    /// Blocks until a wake phrase is heard.
    async fn wait_for_wake(&mut self) -> Result<String>;

    /// Blocks until a command keyword is heard.
    async fn wait_for_command(&mut self) -> Result<String>;

    /// Captures one free-form utterance, possibly empty.
    async fn listen_full(&mut self) -> Result<String>;
}

/// Wake, command and free-form decoders reading serially from one source.
pub struct RecognitionChannels<S, D> {
    source: S,
    wake: D,
    command: D,
    free_form: D,
}

impl<S, D> RecognitionChannels<S, D>
where
    S: AudioSource,
    D: Decoder,
{
    pub fn new(source: S, wake: D, command: D, free_form: D) -> Self {
        Self {
            source,
            wake,
            command,
            free_form,
        }
    }

    pub fn free_form(&self) -> &D {
        &self.free_form
    }
}

#[async_trait]
impl<S, D> Listener for RecognitionChannels<S, D>
where
    S: AudioSource,
    D: Decoder,
{
    async fn wait_for_wake(&mut self) -> Result<String> {
        next_phrase(&mut self.source, &mut self.wake).await
    }

    async fn wait_for_command(&mut self) -> Result<String> {
        next_phrase(&mut self.source, &mut self.command).await
    }

    async fn listen_full(&mut self) -> Result<String> {
        // A partial result left over from an earlier call must not leak in.
        self.free_form.reset();
        loop {
            let frame = self.source.read_frame().await?;
            if let Some(text) = self.free_form.accept(&frame)? {
                return Ok(clean_transcript(&text));
            }
        }
    }
}

async fn next_phrase<S, D>(source: &mut S, decoder: &mut D) -> Result<String>
where
    S: AudioSource,
    D: Decoder,
{
    loop {
        let frame = source.read_frame().await?;
        if let Some(text) = decoder.accept(&frame)? {
            let text = clean_transcript(&text);
            if !text.is_empty() {
                return Ok(text);
            }
            debug!("Finalized utterance carried no grammar phrase");
        }
    }
}

/// Strips decoder markers such as `[unk]` and collapses whitespace.
pub fn clean_transcript(text: &str) -> String {
    static MARKERS: OnceLock<Regex> = OnceLock::new();
    let markers = MARKERS.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("valid marker regex"));

    let stripped = markers.replace_all(text, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Phrases the command decoder may recognize: every registered keyword in
/// registration order, then any exit keyword not already registered.
pub fn command_grammar(registry: &HandlerRegistry) -> Vec<String> {
    let mut grammar = registry.keywords();
    for exit in EXIT_KEYWORDS {
        if !grammar.iter().any(|k| k == exit) {
            grammar.push(exit.to_string());
        }
    }
    grammar
}
