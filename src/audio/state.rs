use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::traits::{AudioOutput, PlaybackHandle};

/// What the controller is doing, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Nothing audible is requested: the current handle is paused or unbound.
    Idle,
    Playing,
    Transitioning { progress: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub track: String,
    pub volume: f32,
    pub paused: bool,
    pub muted: bool,
    pub looping: bool,
    pub position: Duration,
}

impl ChannelSnapshot {
    fn of(handle: &dyn PlaybackHandle) -> Self {
        Self {
            track: handle.source().to_string(),
            volume: handle.volume(),
            paused: handle.is_paused(),
            muted: handle.is_muted(),
            looping: handle.is_looping(),
            position: handle.position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckSnapshot {
    pub phase: Phase,
    pub target_volume: f32,
    pub muted: bool,
    pub current: ChannelSnapshot,
    pub outgoing: Option<ChannelSnapshot>,
}

/// The single animation allowed to drive volumes at any moment. Every
/// animation carries the id of the timer task that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Animation {
    None,
    Crossfade {
        id: u64,
        step: u32,
        total: u32,
        fade_in: bool,
    },
    VolumeRamp {
        id: u64,
        step: u32,
        total: u32,
        start: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    Continue,
    Finished,
}

pub(crate) struct Outgoing {
    handle: Box<dyn PlaybackHandle>,
    start_volume: f32,
}

/// Handles and envelope state shared between the controller and its timers.
pub(crate) struct Deck {
    current: Box<dyn PlaybackHandle>,
    outgoing: Option<Outgoing>,
    target_volume: f32,
    muted: bool,
    animation: Animation,
    next_id: u64,
}

impl Deck {
    pub fn new(current: Box<dyn PlaybackHandle>) -> Self {
        Self {
            current,
            outgoing: None,
            target_volume: 1.0,
            muted: false,
            animation: Animation::None,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn target_volume(&self) -> f32 {
        self.target_volume
    }

    pub fn set_target_volume(&mut self, volume: f32) {
        self.target_volume = volume;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn current_track(&self) -> &str {
        self.current.source()
    }

    pub fn is_crossfading(&self) -> bool {
        matches!(self.animation, Animation::Crossfade { .. })
    }

    pub fn is_animating(&self) -> bool {
        self.animation != Animation::None
    }

    pub fn is_same_track(&self, track: &str) -> bool {
        !track.is_empty() && self.current.source() == track
    }

    /// Silence requested while the current handle is already unbound or
    /// paused. Any fade-out still running is left to finish.
    pub fn is_already_silent(&self, track: &str) -> bool {
        track.is_empty() && (self.current.source().is_empty() || self.current.is_paused())
    }

    pub fn resume_current(&mut self) {
        if self.current.is_paused() {
            if let Err(e) = self.current.play() {
                warn!(track = self.current.source(), error = %e, "playback_resume_failed");
            }
        }
    }

    /// Applies the target volume right away unless an animation owns the
    /// volume.
    pub fn apply_target_volume(&mut self) {
        if !self.is_animating() {
            self.current.set_volume(self.target_volume);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.current.set_muted(muted);
        if let Some(outgoing) = &mut self.outgoing {
            outgoing.handle.set_muted(muted);
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.current.set_looping(looping);
    }

    /// Releases an outgoing handle left paused by `halt`. A fade-out that is
    /// still running keeps its handle.
    pub fn release_parked(&mut self) {
        if !self.is_crossfading() && self.outgoing.is_some() {
            debug!("parked_outgoing_released");
            self.discard_outgoing();
        }
    }

    fn discard_outgoing(&mut self) {
        if let Some(mut outgoing) = self.outgoing.take() {
            outgoing.handle.stop();
        }
    }

    /// Moves the current track out of the way and starts `track` silently.
    ///
    /// Returns the id for the crossfade timer, or `None` when there is
    /// nothing to animate.
    pub fn begin_crossfade(
        &mut self,
        output: &dyn AudioOutput,
        track: &str,
        looped: bool,
        steps: u32,
    ) -> Option<u64> {
        self.animation = Animation::None;
        if self.outgoing.is_some() {
            debug!("outgoing_discarded");
            self.discard_outgoing();
        }

        if !self.current.is_paused() && !self.current.source().is_empty() {
            let mut fresh = output.create_handle();
            fresh.set_muted(self.muted);
            let previous = std::mem::replace(&mut self.current, fresh);
            let start_volume = previous.volume();
            self.outgoing = Some(Outgoing {
                handle: previous,
                start_volume,
            });
        }

        self.current.set_looping(looped);
        let fade_in = !track.is_empty();
        if fade_in {
            self.current.bind(track);
            self.current.set_volume(0.0);
            if let Err(e) = self.current.play() {
                warn!(track, error = %e, "playback_start_failed");
            }
        }

        if !fade_in && self.outgoing.is_none() {
            return None;
        }

        let id = self.next_id();
        self.animation = Animation::Crossfade {
            id,
            step: 0,
            total: steps.max(1),
            fade_in,
        };
        debug!(
            track,
            fade_in,
            fading_out = self.outgoing.as_ref().map(|o| o.handle.source()),
            target = self.target_volume,
            "crossfade_started"
        );
        Some(id)
    }

    pub fn advance_crossfade(&mut self, timer: u64) -> Tick {
        let Animation::Crossfade {
            id,
            step,
            total,
            fade_in,
        } = self.animation
        else {
            return Tick::Finished;
        };
        if id != timer {
            return Tick::Finished;
        }

        let step = step + 1;
        let progress = step as f32 / total as f32;

        if fade_in {
            let volume = (progress * self.target_volume).clamp(0.0, self.target_volume);
            self.current.set_volume(volume);
        }
        if let Some(outgoing) = &mut self.outgoing {
            let volume =
                (outgoing.start_volume * (1.0 - progress)).clamp(0.0, outgoing.start_volume);
            outgoing.handle.set_volume(volume);
        }

        if step < total {
            self.animation = Animation::Crossfade {
                id,
                step,
                total,
                fade_in,
            };
            return Tick::Continue;
        }

        self.animation = Animation::None;
        self.discard_outgoing();
        if fade_in {
            self.current.set_volume(self.target_volume);
        }
        debug!(track = self.current.source(), "crossfade_finished");
        Tick::Finished
    }

    /// Starts moving the current track toward the target volume. Differences
    /// under `tolerance` are applied at once and return `None`.
    pub fn begin_volume_ramp(&mut self, tolerance: f32, steps: u32) -> Option<u64> {
        let start = self.current.volume();
        if (start - self.target_volume).abs() < tolerance {
            self.animation = Animation::None;
            self.current.set_volume(self.target_volume);
            return None;
        }

        let id = self.next_id();
        self.animation = Animation::VolumeRamp {
            id,
            step: 0,
            total: steps.max(1),
            start,
        };
        debug!(from = start, to = self.target_volume, "volume_ramp_started");
        Some(id)
    }

    pub fn advance_volume_ramp(&mut self, timer: u64) -> Tick {
        let Animation::VolumeRamp {
            id,
            step,
            total,
            start,
        } = self.animation
        else {
            return Tick::Finished;
        };
        if id != timer {
            return Tick::Finished;
        }

        let step = step + 1;
        let progress = step as f32 / total as f32;
        let volume = start + (self.target_volume - start) * progress;
        self.current.set_volume(volume.clamp(0.0, 1.0));

        if step < total {
            self.animation = Animation::VolumeRamp {
                id,
                step,
                total,
                start,
            };
            return Tick::Continue;
        }

        self.animation = Animation::None;
        self.current.set_volume(self.target_volume);
        Tick::Finished
    }

    /// Pauses both handles and drops the running animation. Handles stay
    /// bound so playback can resume.
    pub fn halt(&mut self) {
        self.animation = Animation::None;
        self.current.pause();
        if let Some(outgoing) = &mut self.outgoing {
            outgoing.handle.pause();
        }
    }

    pub fn shutdown(&mut self) {
        self.animation = Animation::None;
        self.discard_outgoing();
        self.current.stop();
    }

    pub fn phase(&self) -> Phase {
        match self.animation {
            Animation::Crossfade { step, total, .. } => Phase::Transitioning {
                progress: step as f32 / total as f32,
            },
            _ if !self.current.is_paused() && !self.current.source().is_empty() => Phase::Playing,
            _ => Phase::Idle,
        }
    }

    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            phase: self.phase(),
            target_volume: self.target_volume,
            muted: self.muted,
            current: ChannelSnapshot::of(self.current.as_ref()),
            outgoing: self
                .outgoing
                .as_ref()
                .map(|o| ChannelSnapshot::of(o.handle.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::memory::MemoryOutput;

    fn deck(output: &MemoryOutput) -> Deck {
        Deck::new(output.create_handle())
    }

    fn run_crossfade(deck: &mut Deck, id: u64) -> u32 {
        let mut ticks = 1;
        while deck.advance_crossfade(id) == Tick::Continue {
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn crossfade_from_silence_reuses_the_idle_handle() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);
        deck.set_target_volume(0.5);

        let id = deck.begin_crossfade(&output, "a.mp3", true, 4).unwrap();
        assert_eq!(output.handle_count(), 1);
        assert_eq!(deck.phase(), Phase::Transitioning { progress: 0.0 });

        assert_eq!(run_crossfade(&mut deck, id), 4);
        let record = output.record(0).unwrap();
        assert_eq!(record.volume_history, vec![0.0, 0.125, 0.25, 0.375, 0.5, 0.5]);
        assert_eq!(deck.phase(), Phase::Playing);
    }

    #[test]
    fn stale_timer_ids_do_not_touch_volumes() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);
        let first = deck.begin_crossfade(&output, "a.mp3", true, 4).unwrap();
        let second = deck.begin_crossfade(&output, "b.mp3", true, 4).unwrap();
        assert_ne!(first, second);

        let before = output.records();
        assert_eq!(deck.advance_crossfade(first), Tick::Finished);
        assert_eq!(output.records(), before);
        assert!(deck.is_crossfading());
    }

    #[test]
    fn fade_to_silence_keeps_the_fresh_handle_unbound() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);
        let id = deck.begin_crossfade(&output, "a.mp3", true, 2).unwrap();
        run_crossfade(&mut deck, id);

        let id = deck.begin_crossfade(&output, "", true, 2).unwrap();
        run_crossfade(&mut deck, id);

        assert_eq!(deck.current_track(), "");
        assert_eq!(deck.phase(), Phase::Idle);
        assert!(output.record(0).unwrap().released);
        assert!(output.live_records().iter().all(|r| r.source.is_empty()));
    }

    #[test]
    fn silence_from_silence_needs_no_timer() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);

        assert!(deck.is_already_silent(""));
        assert_eq!(deck.begin_crossfade(&output, "", true, 20), None);
        assert_eq!(deck.phase(), Phase::Idle);
    }

    #[test]
    fn small_volume_changes_snap() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);
        let id = deck.begin_crossfade(&output, "a.mp3", true, 1).unwrap();
        run_crossfade(&mut deck, id);

        deck.set_target_volume(0.97);
        assert_eq!(deck.begin_volume_ramp(0.05, 10), None);
        assert_eq!(output.record(0).unwrap().volume, 0.97);
        assert!(!deck.is_animating());
    }

    #[test]
    fn volume_ramp_follows_a_moving_target() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);
        deck.set_target_volume(1.0);
        let id = deck.begin_crossfade(&output, "a.mp3", true, 1).unwrap();
        run_crossfade(&mut deck, id);

        deck.set_target_volume(0.0);
        let id = deck.begin_volume_ramp(0.05, 4).unwrap();
        assert_eq!(deck.advance_volume_ramp(id), Tick::Continue);
        assert_eq!(output.record(0).unwrap().volume, 0.75);

        deck.set_target_volume(0.5);
        deck.apply_target_volume();
        assert_eq!(output.record(0).unwrap().volume, 0.75);

        while deck.advance_volume_ramp(id) == Tick::Continue {}
        assert_eq!(output.record(0).unwrap().volume, 0.5);
    }

    #[test]
    fn halt_parks_the_outgoing_handle() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);
        let id = deck.begin_crossfade(&output, "a.mp3", true, 1).unwrap();
        run_crossfade(&mut deck, id);
        deck.begin_crossfade(&output, "b.mp3", true, 4).unwrap();

        deck.halt();

        let snapshot = deck.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.current.paused);
        let parked = snapshot.outgoing.unwrap();
        assert_eq!(parked.track, "a.mp3");
        assert!(parked.paused);
        assert_eq!(output.live_records().len(), 2);
    }

    #[test]
    fn parked_outgoing_is_released_once_nothing_fades() {
        let output = MemoryOutput::new();
        let mut deck = deck(&output);
        let id = deck.begin_crossfade(&output, "a.mp3", true, 1).unwrap();
        run_crossfade(&mut deck, id);

        deck.begin_crossfade(&output, "b.mp3", true, 4).unwrap();
        deck.release_parked();
        assert!(deck.snapshot().outgoing.is_some());

        deck.halt();
        deck.release_parked();

        assert!(deck.snapshot().outgoing.is_none());
        assert!(output.record(0).unwrap().released);
        assert_eq!(output.live_records().len(), 1);
    }
}
