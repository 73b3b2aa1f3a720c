use std::sync::Arc;

use crate::audio::{
    config::FadeConfig,
    controller::AudioController,
    error::AudioError,
    state::DeckSnapshot,
    traits::AudioOutput,
};

/// The music a scene asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCue {
    /// Empty for silence.
    pub track: String,
    pub volume: f32,
    pub looped: bool,
}

impl AudioCue {
    pub fn new(track: impl Into<String>, volume: f32, looped: bool) -> Self {
        Self {
            track: track.into(),
            volume,
            looped,
        }
    }

    pub fn silence() -> Self {
        Self::new("", 1.0, true)
    }

    /// Builds a cue from optional scene fields: no music means silence, the
    /// volume defaults to full and tracks loop unless told otherwise.
    pub fn from_scene(music: Option<&str>, volume: Option<f32>, looped: Option<bool>) -> Self {
        Self::new(
            music.unwrap_or_default(),
            volume.unwrap_or(1.0),
            looped.unwrap_or(true),
        )
    }

    pub fn is_silence(&self) -> bool {
        self.track.is_empty()
    }
}

impl Default for AudioCue {
    fn default() -> Self {
        Self::silence()
    }
}

/// Scene-facing side of the controller: forwards the full audio state of a
/// scene on every change.
pub struct AudioSystem {
    controller: AudioController,
    cue: AudioCue,
    playing: bool,
    muted: bool,
}

impl AudioSystem {
    pub fn new(output: Arc<dyn AudioOutput>, config: FadeConfig) -> Result<Self, AudioError> {
        Ok(Self {
            controller: AudioController::new(output, config)?,
            cue: AudioCue::silence(),
            playing: false,
            muted: false,
        })
    }

    /// Mute is applied before playback so a newly started track never leaks
    /// through while muted.
    pub fn sync(&mut self, cue: AudioCue, playing: bool, muted: bool) {
        self.controller.set_mute(muted);
        if playing {
            self.controller.play(&cue.track, cue.volume, cue.looped);
        } else {
            self.controller.stop();
        }

        self.cue = cue;
        self.playing = playing;
        self.muted = muted;
    }

    pub fn set_cue(&mut self, cue: AudioCue) {
        self.sync(cue, self.playing, self.muted);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.sync(self.cue.clone(), playing, self.muted);
    }

    pub fn toggle_playing(&mut self) {
        self.set_playing(!self.playing);
    }

    pub fn toggle_mute(&mut self) {
        self.sync(self.cue.clone(), self.playing, !self.muted);
    }

    pub fn cue(&self) -> &AudioCue {
        &self.cue
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn snapshot(&self) -> DeckSnapshot {
        self.controller.snapshot()
    }

    pub fn controller(&self) -> &AudioController {
        &self.controller
    }
}
