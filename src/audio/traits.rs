use crate::audio::error::AudioError;
use std::time::Duration;

/// One track bound to a playback device.
///
/// Volume is the envelope value in `[0, 1]`; mute is layered on top of it, so
/// a muted handle still reports the volume it would play at.
pub trait PlaybackHandle: Send {
    /// Bound track identifier, empty when nothing is bound.
    fn source(&self) -> &str;
    /// Binds `track` without starting it. Replaces whatever was bound before.
    fn bind(&mut self, track: &str);
    /// Starts or resumes without blocking. Only problems known up front are
    /// returned; a backend that loads in the background logs later failures
    /// and reports the handle as paused.
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    /// Stops playback and releases the decoded source.
    fn stop(&mut self);
    fn is_paused(&self) -> bool;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn is_looping(&self) -> bool;
    /// Takes effect the next time a source is started.
    fn set_looping(&mut self, looping: bool);
    fn position(&self) -> Duration;
}

pub trait AudioOutput: Send + Sync {
    fn create_handle(&self) -> Box<dyn PlaybackHandle>;
}
