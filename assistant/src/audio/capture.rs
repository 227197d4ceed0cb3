use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfigRange};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

const CHANNELS: u16 = 1;

/// Microphone input as 16-bit mono PCM chunks on a broadcast channel.
pub struct AudioCapture {
    device: Device,
    sample_rate: u32,
    stream: Option<Stream>,
    is_running: Arc<AtomicBool>,
}

impl AudioCapture {
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No default input device found"))?;

        tracing::info!("Audio capture initialized");
        tracing::info!("Using input device: {}", device.name()?);

        Ok(Self {
            device,
            sample_rate,
            stream: None,
            is_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn start(&mut self, audio_tx: broadcast::Sender<Vec<i16>>) -> Result<()> {
        if self.stream.is_some() {
            return Err(anyhow::anyhow!("Audio capture already running"));
        }

        tracing::info!(
            "Configuring audio stream: {}Hz, {} channel(s)",
            self.sample_rate,
            CHANNELS
        );

        let (final_config, sample_format) =
            choose_config(self.device.supported_input_configs()?, self.sample_rate)
                .ok_or_else(|| anyhow::anyhow!("No suitable audio configuration found"))?;

        let error_callback = |err| {
            tracing::error!("Audio stream error: {}", err);
        };

        self.is_running.store(true, Ordering::SeqCst);
        let is_running = Arc::clone(&self.is_running);

        let stream = match sample_format {
            SampleFormat::I16 => self.device.build_input_stream(
                &final_config,
                move |data: &[i16], _: &_| {
                    Self::forward_chunk(data.to_vec(), &audio_tx, &is_running);
                },
                error_callback,
                None,
            )?,
            SampleFormat::F32 => self.device.build_input_stream(
                &final_config,
                move |data: &[f32], _: &_| {
                    let converted = data.iter().map(|&s| f32_to_i16(s)).collect();
                    Self::forward_chunk(converted, &audio_tx, &is_running);
                },
                error_callback,
                None,
            )?,
            SampleFormat::U16 => self.device.build_input_stream(
                &final_config,
                move |data: &[u16], _: &_| {
                    let converted = data.iter().map(|&s| u16_to_i16(s)).collect();
                    Self::forward_chunk(converted, &audio_tx, &is_running);
                },
                error_callback,
                None,
            )?,
            format => {
                self.is_running.store(false, Ordering::SeqCst);
                return Err(anyhow::anyhow!("Unsupported sample format: {:?}", format));
            }
        };

        stream.play()?;
        self.stream = Some(stream);

        tracing::info!("Audio capture started");
        Ok(())
    }

    fn forward_chunk(
        chunk: Vec<i16>,
        audio_tx: &broadcast::Sender<Vec<i16>>,
        is_running: &AtomicBool,
    ) {
        if is_running.load(Ordering::Relaxed) {
            // No receivers is not an error while the loop is between phases.
            let _ = audio_tx.send(chunk);
        }
    }

    pub fn stop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
        tracing::info!("Audio capture stopped");
    }
}

/// First mono range covering `sample_rate`, with the sample format that
/// range delivers.
fn choose_config(
    ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
    sample_rate: u32,
) -> Option<(StreamConfig, SampleFormat)> {
    ranges.into_iter().find_map(|supported| {
        tracing::debug!("Supported config: {:?}", supported);
        let fits = supported.channels() == CHANNELS
            && supported.min_sample_rate().0 <= sample_rate
            && supported.max_sample_rate().0 >= sample_rate;
        fits.then(|| {
            let format = supported.sample_format();
            let config = supported.with_sample_rate(cpal::SampleRate(sample_rate));
            (config.into(), format)
        })
    })
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn u16_to_i16(sample: u16) -> i16 {
    (sample as i32 - 32768) as i16
}
