use anyhow::{Context, Result};
use clap::Parser;
use echoduck::recognition::command_grammar;
use echoduck::recognition::vosk::open_channels;
use echoduck::{
    AudioCapture, DispatchOptions, Dispatcher, FrameReader, HandlerRegistry, SpeechGate,
};
use echoduck::speech::SystemVoice;
use shared::config::{default_config_path, ConfigStore};
use shared::plugin::PluginContext;
use shared::speech::Speak;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "echoduck")]
#[command(about = "Voice-driven command dispatcher")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    // stdout carries the protocol markers, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("echoduck starting...");

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let store = Arc::new(ConfigStore::load(config_path)?);
    let config = store.snapshot();
    let model_path = config.stt.require_model_path()?.to_path_buf();
    let name = config.assistant.name.clone();

    let engine = SystemVoice::detect()?;
    let speaker: Arc<dyn Speak> = Arc::new(SpeechGate::new(name, engine, &config.tts));

    let ctx = PluginContext::new(Arc::clone(&store), Arc::clone(&speaker));
    let registry = Arc::new(HandlerRegistry::from_plugins(&plugins::builtin(), &ctx));
    let grammar = command_grammar(&registry);

    let (audio_tx, audio_rx) = broadcast::channel(config.audio.buffer_capacity.max(1));
    let mut capture = AudioCapture::new(config.audio.sample_rate)?;
    capture.start(audio_tx)?;

    let source = FrameReader::new(audio_rx, config.audio.frame_size);
    let channels = open_channels(
        &model_path,
        config.audio.sample_rate,
        &config.assistant.wake_phrases(),
        &grammar,
        source,
    )
    .context("Failed to initialize speech recognition")?;

    let mut dispatcher = Dispatcher::new(
        channels,
        registry,
        speaker,
        DispatchOptions::from_config(&config),
    );
    let result = dispatcher.run().await;

    capture.stop();
    info!("echoduck stopped");
    result
}
