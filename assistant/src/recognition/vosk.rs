//! Vosk-backed decoders. Every channel shares one loaded model.

use super::{Decoder, RecognitionChannels};
use crate::audio::frames::AudioSource;
use anyhow::Result;
use std::path::Path;
use tracing::info;
use vosk::{DecodingState, Model, Recognizer};

pub struct VoskDecoder {
    recognizer: Recognizer,
}

impl VoskDecoder {
    /// A decoder restricted to `phrases`.
    pub fn with_grammar(model: &Model, sample_rate: u32, phrases: &[String]) -> Result<Self> {
        let recognizer = Recognizer::new_with_grammar(model, sample_rate as f32, phrases)
            .ok_or_else(|| anyhow::anyhow!("Failed to create grammar recognizer"))?;
        Ok(Self { recognizer })
    }

    /// An unrestricted decoder.
    pub fn free_form(model: &Model, sample_rate: u32) -> Result<Self> {
        let recognizer = Recognizer::new(model, sample_rate as f32)
            .ok_or_else(|| anyhow::anyhow!("Failed to create recognizer"))?;
        Ok(Self { recognizer })
    }
}

impl Decoder for VoskDecoder {
    fn accept(&mut self, frame: &[i16]) -> Result<Option<String>> {
        match self.recognizer.accept_waveform(frame) {
            DecodingState::Running => Ok(None),
            DecodingState::Finalized => {
                let text = self
                    .recognizer
                    .result()
                    .single()
                    .map(|r| r.text.to_string())
                    .unwrap_or_default();
                Ok(Some(text))
            }
            DecodingState::Failed => Err(anyhow::anyhow!("Speech decoder failed")),
        }
    }

    fn reset(&mut self) {
        self.recognizer.reset();
    }
}

pub fn load_model(path: &Path) -> Result<Model> {
    info!("Loading speech model from {:?}", path);
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Model path is not valid UTF-8: {:?}", path))?;
    Model::new(path_str).ok_or_else(|| anyhow::anyhow!("Failed to load speech model at {:?}", path))
}

/// Builds the wake, command and free-form channels over one audio source.
pub fn open_channels<S: AudioSource>(
    model_path: &Path,
    sample_rate: u32,
    wake_phrases: &[String],
    command_grammar: &[String],
    source: S,
) -> Result<RecognitionChannels<S, VoskDecoder>> {
    let model = load_model(model_path)?;

    info!("Wake phrases: {:?}", wake_phrases);
    info!("Command grammar: {:?}", command_grammar);

    let wake = VoskDecoder::with_grammar(&model, sample_rate, wake_phrases)?;
    let command = VoskDecoder::with_grammar(&model, sample_rate, command_grammar)?;
    let free_form = VoskDecoder::free_form(&model, sample_rate)?;

    Ok(RecognitionChannels::new(source, wake, command, free_form))
}
