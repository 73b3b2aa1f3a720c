use std::time::Duration;

use clap::Parser;

use crate::audio::{AudioCue, FadeConfig};

/// Crossfading scene-music player for the terminal.
///
/// Each TRACK becomes a scene cue bound to the number keys 1-9; 0 fades to
/// silence.
#[derive(Parser, Debug, Clone)]
#[command(name = "novel-audio", version, about)]
pub struct Cli {
    /// Audio files, one per cue
    #[arg(value_name = "TRACK")]
    pub tracks: Vec<String>,

    /// Volume every cue plays at, 0.0 to 1.0
    #[arg(long, env = "NOVEL_AUDIO_VOLUME", default_value_t = 1.0)]
    pub volume: f32,

    /// Crossfade length in milliseconds
    #[arg(long, env = "NOVEL_AUDIO_FADE_MS", default_value_t = 1000)]
    pub fade_ms: u64,

    /// Number of volume steps in a crossfade
    #[arg(long, env = "NOVEL_AUDIO_FADE_STEPS", default_value_t = 20)]
    pub fade_steps: u32,

    /// Same-track volume fade length in milliseconds
    #[arg(long, env = "NOVEL_AUDIO_VOLUME_FADE_MS", default_value_t = 500)]
    pub volume_fade_ms: u64,

    /// Number of steps in a same-track volume fade
    #[arg(long, env = "NOVEL_AUDIO_VOLUME_FADE_STEPS", default_value_t = 10)]
    pub volume_fade_steps: u32,

    /// Play every cue once instead of looping it
    #[arg(long)]
    pub no_loop: bool,

    /// Run without an audio device
    #[arg(long, env = "NOVEL_AUDIO_SILENT")]
    pub silent: bool,
}

impl Cli {
    pub fn fade_config(&self) -> FadeConfig {
        FadeConfig::default()
            .with_fade(Duration::from_millis(self.fade_ms), self.fade_steps)
            .with_volume_fade(
                Duration::from_millis(self.volume_fade_ms),
                self.volume_fade_steps,
            )
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.tracks
            .iter()
            .map(|track| AudioCue::new(track.as_str(), self.volume, !self.no_loop))
            .collect()
    }
}
