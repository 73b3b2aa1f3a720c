use std::{
    fs::File,
    io::BufReader,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use rodio::{Decoder, OutputStream, Sink, Source, mixer::Mixer};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::audio::{
    error::AudioError,
    traits::{AudioOutput, PlaybackHandle},
    util::{lock, open_stream, setup_device_config},
};

/// Keeps the device stream open. Every handle created through
/// [`PlaybackEngine::output`] is mixed into this stream and goes quiet once the
/// engine is dropped.
pub struct PlaybackEngine {
    _stream: OutputStream,
    mixer: Mixer,
}

impl PlaybackEngine {
    pub fn new() -> Result<Self, AudioError> {
        let (device, stream_config, sample_format) = setup_device_config()?;
        let stream = open_stream(device, &stream_config, sample_format)?;
        let mixer = stream.mixer().clone();
        info!(
            channels = stream_config.channels,
            sample_rate = stream_config.sample_rate.0,
            "audio_output_opened"
        );

        Ok(Self {
            _stream: stream,
            mixer,
        })
    }

    /// Handles decode on the blocking pool of the calling tokio runtime.
    pub fn output(&self) -> Result<RodioOutput, AudioError> {
        let runtime =
            Handle::try_current().map_err(|e| AudioError::RuntimeUnavailable(e.to_string()))?;
        Ok(RodioOutput {
            mixer: self.mixer.clone(),
            runtime,
        })
    }
}

#[derive(Clone)]
pub struct RodioOutput {
    mixer: Mixer,
    runtime: Handle,
}

impl AudioOutput for RodioOutput {
    fn create_handle(&self) -> Box<dyn PlaybackHandle> {
        Box::new(SinkHandle::new(self.mixer.clone(), self.runtime.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Idle,
    Pending,
    Ready,
    Failed,
}

/// A rodio [`Sink`] holding at most one decoded track.
///
/// Binding only records the track. `play` unpauses at once and leaves opening
/// and decoding the file to a blocking task; a missing or undecodable file is
/// logged from there and the next `play` tries again. Every rebind or stop
/// moves to a fresh sink and bumps the generation, so a load that finishes
/// late never touches the new binding.
pub struct SinkHandle {
    mixer: Mixer,
    runtime: Handle,
    sink: Arc<Sink>,
    load: Arc<Mutex<LoadState>>,
    generation: Arc<AtomicU64>,
    source: String,
    playing: bool,
    volume: f32,
    muted: bool,
    looping: bool,
}

impl SinkHandle {
    fn new(mixer: Mixer, runtime: Handle) -> Self {
        let sink = idle_sink(&mixer);
        Self {
            mixer,
            runtime,
            sink,
            load: Arc::new(Mutex::new(LoadState::Idle)),
            generation: Arc::new(AtomicU64::new(0)),
            source: String::new(),
            playing: false,
            volume: 1.0,
            muted: false,
            looping: true,
        }
    }

    fn load_state(&self) -> LoadState {
        *lock(&self.load)
    }

    /// Abandons the current sink and any load in flight.
    fn reset(&mut self) {
        {
            let mut load = lock(&self.load);
            self.generation.fetch_add(1, Ordering::SeqCst);
            *load = LoadState::Idle;
        }
        self.sink.stop();
        self.sink = idle_sink(&self.mixer);
        self.playing = false;
        self.apply_volume();
    }

    fn start_load(&mut self) {
        let generation = {
            let mut load = lock(&self.load);
            *load = LoadState::Pending;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let loader = Loader {
            path: self.source.clone(),
            looping: self.looping,
            generation,
            current: self.generation.clone(),
            sink: self.sink.clone(),
            load: self.load.clone(),
        };
        self.runtime.spawn_blocking(move || loader.run());
    }

    fn apply_volume(&self) {
        self.sink
            .set_volume(if self.muted { 0.0 } else { self.volume });
    }
}

fn idle_sink(mixer: &Mixer) -> Arc<Sink> {
    let sink = Sink::connect_new(mixer);
    sink.pause();
    Arc::new(sink)
}

fn open_track(path: &str) -> Result<File, AudioError> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AudioError::TrackNotFound(path.to_string()),
        _ => AudioError::PlaybackBlocked(format!("{path}: {e}")),
    })
}

/// One decode job, run on the blocking pool.
struct Loader {
    path: String,
    looping: bool,
    generation: u64,
    current: Arc<AtomicU64>,
    sink: Arc<Sink>,
    load: Arc<Mutex<LoadState>>,
}

impl Loader {
    fn run(self) {
        let file = match open_track(&self.path) {
            Ok(file) => file,
            Err(e) => return self.fail(e),
        };
        let byte_len = file.metadata().map(|m| m.len()).ok();

        let mut builder = Decoder::builder()
            .with_data(BufReader::new(file))
            .with_seekable(true);
        if let Some(len) = byte_len {
            builder = builder.with_byte_len(len);
        }

        let decoded = if self.looping {
            builder.build_looped().map(|decoder| self.commit(decoder))
        } else {
            builder.build().map(|decoder| self.commit(decoder))
        };
        if let Err(e) = decoded {
            self.fail(AudioError::DecodingError(format!("{}: {e}", self.path)));
        }
    }

    fn is_stale(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }

    fn commit<S>(&self, source: S)
    where
        S: Source + Send + 'static,
    {
        let mut load = lock(&self.load);
        if self.is_stale() {
            return;
        }
        self.sink.append(source);
        *load = LoadState::Ready;
        debug!(track = self.path.as_str(), looping = self.looping, "sink_loaded");
    }

    fn fail(&self, error: AudioError) {
        let mut load = lock(&self.load);
        if self.is_stale() {
            return;
        }
        *load = LoadState::Failed;
        warn!(track = self.path.as_str(), error = %error, "playback_start_failed");
    }
}

impl PlaybackHandle for SinkHandle {
    fn source(&self) -> &str {
        &self.source
    }

    fn bind(&mut self, track: &str) {
        self.reset();
        self.source = track.to_string();
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.source.is_empty() {
            return Err(AudioError::NoSource);
        }
        let needs_load = match self.load_state() {
            LoadState::Idle | LoadState::Failed => true,
            // a finished single-shot track restarts from the top
            LoadState::Ready => self.sink.empty(),
            LoadState::Pending => false,
        };
        if needs_load {
            self.start_load();
        }
        self.apply_volume();
        self.sink.play();
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.playing = false;
    }

    fn stop(&mut self) {
        self.reset();
    }

    fn is_paused(&self) -> bool {
        if !self.playing {
            return true;
        }
        match self.load_state() {
            LoadState::Ready => self.sink.empty(),
            LoadState::Failed => true,
            LoadState::Idle | LoadState::Pending => false,
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.apply_volume();
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_volume();
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }
}

impl Drop for SinkHandle {
    fn drop(&mut self) {
        let _load = lock(&self.load);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.sink.stop();
    }
}
