pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod memory;
pub mod playback;
pub mod state;
pub mod system;
pub mod traits;
pub mod util;

pub use commands::AudioCommand;
pub use config::FadeConfig;
pub use controller::{AudioController, FadeTimer};
pub use error::AudioError;
pub use memory::{HandleRecord, MemoryOutput};
pub use playback::{PlaybackEngine, RodioOutput};
pub use state::{ChannelSnapshot, DeckSnapshot, Phase};
pub use system::{AudioCue, AudioSystem};
pub use traits::{AudioOutput, PlaybackHandle};
