pub mod audio;
pub mod dispatch;
pub mod recognition;
pub mod registry;
pub mod resolver;
pub mod speech;

pub use audio::capture::AudioCapture;
pub use audio::frames::{AudioSource, FrameReader};
pub use dispatch::{CycleOutcome, DispatchOptions, DispatchState, Dispatcher};
pub use recognition::{Decoder, Listener, RecognitionChannels};
pub use registry::{HandlerRegistry, RegistryBuilder};
pub use speech::{SpeechEngine, SpeechGate, VoiceProfile};
