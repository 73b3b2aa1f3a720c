use std::sync::{Arc, Mutex};

use tokio::{
    runtime::Handle,
    time::{Instant, interval_at},
};
use tracing::debug;

use crate::{
    audio::{
        commands::AudioCommand,
        config::FadeConfig,
        error::AudioError,
        state::{Deck, DeckSnapshot, Phase, Tick},
        traits::AudioOutput,
        util::{clamp_volume, lock},
    },
    util::task::TaskManager,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeTimer {
    Transition,
    Volume,
}

/// Background-music controller that crossfades between tracks.
///
/// Owns one current playback handle, plus an outgoing handle while a
/// previous track fades out. Fades are stepped by tokio timer tasks; the
/// controller must be created inside a tokio runtime. Dropping it cancels
/// every timer and stops both handles.
pub struct AudioController {
    output: Arc<dyn AudioOutput>,
    deck: Arc<Mutex<Deck>>,
    config: FadeConfig,
    tasks: TaskManager<FadeTimer>,
    runtime: Handle,
}

impl AudioController {
    pub fn new(output: Arc<dyn AudioOutput>, config: FadeConfig) -> Result<Self, AudioError> {
        let runtime =
            Handle::try_current().map_err(|e| AudioError::RuntimeUnavailable(e.to_string()))?;
        let deck = Deck::new(output.create_handle());

        Ok(Self {
            output,
            deck: Arc::new(Mutex::new(deck)),
            config,
            tasks: TaskManager::new(),
            runtime,
        })
    }

    pub fn handle_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Play {
                track,
                volume,
                looped,
            } => self.play(&track, volume, looped),
            AudioCommand::SetTargetVolume(volume) => self.set_target_volume(volume),
            AudioCommand::SetMute(muted) => self.set_mute(muted),
            AudioCommand::Stop => self.stop(),
        }
    }

    /// Makes `track` audible at `volume`; an empty `track` fades to silence.
    ///
    /// The same track keeps playing and only its volume moves; its loop flag
    /// applies the next time it is started. Any other track crossfades with
    /// whatever is playing, cutting short a crossfade that is still running.
    pub fn play(&mut self, track: &str, volume: f32, looped: bool) {
        let volume = clamp_volume(volume);
        let mut deck = lock(&self.deck);
        deck.set_target_volume(volume);

        if deck.is_same_track(track) {
            deck.set_looping(looped);
            deck.resume_current();
            // a running crossfade reads the new target on its next step
            if deck.is_crossfading() {
                return;
            }
            deck.release_parked();
            self.tasks.abort(&FadeTimer::Volume);
            let ramp = deck.begin_volume_ramp(
                self.config.volume_snap_tolerance,
                self.config.volume_fade_steps,
            );
            drop(deck);
            if let Some(id) = ramp {
                self.spawn_volume_ramp(id);
            }
            return;
        }

        if deck.is_already_silent(track) {
            deck.release_parked();
            return;
        }

        self.tasks.abort_all();
        let crossfade =
            deck.begin_crossfade(self.output.as_ref(), track, looped, self.config.fade_steps);
        drop(deck);
        if let Some(id) = crossfade {
            self.spawn_crossfade(id);
        }
    }

    /// Remembers `volume` for the current track. It is applied now if no fade
    /// is running, otherwise the running fade carries it.
    pub fn set_target_volume(&mut self, volume: f32) {
        let mut deck = lock(&self.deck);
        deck.set_target_volume(clamp_volume(volume));
        deck.apply_target_volume();
    }

    pub fn set_mute(&mut self, muted: bool) {
        lock(&self.deck).set_muted(muted);
    }

    /// Pauses everything and cancels running fades. Handles stay bound, so a
    /// following `play` of the same track resumes it.
    pub fn stop(&mut self) {
        self.tasks.abort_all();
        lock(&self.deck).halt();
        debug!("audio_stopped");
    }

    pub fn phase(&self) -> Phase {
        lock(&self.deck).phase()
    }

    pub fn snapshot(&self) -> DeckSnapshot {
        lock(&self.deck).snapshot()
    }

    pub fn target_volume(&self) -> f32 {
        lock(&self.deck).target_volume()
    }

    pub fn is_muted(&self) -> bool {
        lock(&self.deck).is_muted()
    }

    pub fn current_track(&self) -> String {
        lock(&self.deck).current_track().to_string()
    }

    /// Whether a fade timer of the given kind is still scheduled.
    pub fn is_timer_active(&self, timer: FadeTimer) -> bool {
        self.tasks.is_active(&timer)
    }

    pub fn active_timers(&self) -> usize {
        self.tasks.active_count()
    }

    fn spawn_crossfade(&mut self, id: u64) {
        let deck = self.deck.clone();
        let period = self.config.fade_step_interval();
        let task = self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if lock(&deck).advance_crossfade(id) == Tick::Finished {
                    break;
                }
            }
        });
        self.tasks.spawn(FadeTimer::Transition, task);
    }

    fn spawn_volume_ramp(&mut self, id: u64) {
        let deck = self.deck.clone();
        let period = self.config.volume_step_interval();
        let task = self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if lock(&deck).advance_volume_ramp(id) == Tick::Finished {
                    break;
                }
            }
        });
        self.tasks.spawn(FadeTimer::Volume, task);
    }
}

impl Drop for AudioController {
    fn drop(&mut self) {
        self.tasks.abort_all();
        lock(&self.deck).shutdown();
    }
}
