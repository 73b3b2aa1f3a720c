use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::audio::{
    error::AudioError,
    traits::{AudioOutput, PlaybackHandle},
    util::lock,
};

/// Everything observable about one handle created by a [`MemoryOutput`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandleRecord {
    pub source: String,
    pub volume: f32,
    pub muted: bool,
    pub looping: bool,
    pub paused: bool,
    pub released: bool,
    pub play_attempts: u32,
    /// Every value passed to `set_volume`, in order.
    pub volume_history: Vec<f32>,
}

impl Default for HandleRecord {
    fn default() -> Self {
        Self {
            source: String::new(),
            volume: 1.0,
            muted: false,
            looping: true,
            paused: true,
            released: false,
            play_attempts: 0,
            volume_history: Vec::new(),
        }
    }
}

impl HandleRecord {
    /// What a listener would hear from this handle.
    pub fn audible_volume(&self) -> f32 {
        if self.muted || self.paused || self.released {
            0.0
        } else {
            self.volume
        }
    }
}

#[derive(Default)]
struct Registry {
    handles: Vec<Arc<Mutex<HandleRecord>>>,
    failing: HashSet<String>,
}

/// Output that plays nothing and remembers everything.
///
/// Used when no device is available and by the tests, which keep a clone to
/// inspect handles after the controller has taken ownership of them.
#[derive(Clone, Default)]
pub struct MemoryOutput {
    registry: Arc<Mutex<Registry>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `play` of `track` fail as if the file were missing.
    pub fn fail_track(&self, track: &str) {
        lock(&self.registry).failing.insert(track.to_string());
    }

    pub fn handle_count(&self) -> usize {
        lock(&self.registry).handles.len()
    }

    pub fn record(&self, index: usize) -> Option<HandleRecord> {
        let registry = lock(&self.registry);
        registry.handles.get(index).map(|h| lock(h).clone())
    }

    pub fn records(&self) -> Vec<HandleRecord> {
        lock(&self.registry)
            .handles
            .iter()
            .map(|h| lock(h).clone())
            .collect()
    }

    /// Handles that have not been released yet.
    pub fn live_records(&self) -> Vec<HandleRecord> {
        self.records().into_iter().filter(|r| !r.released).collect()
    }
}

impl AudioOutput for MemoryOutput {
    fn create_handle(&self) -> Box<dyn PlaybackHandle> {
        let record = Arc::new(Mutex::new(HandleRecord::default()));
        lock(&self.registry).handles.push(record.clone());
        Box::new(MemoryHandle {
            record,
            registry: self.registry.clone(),
            played: Duration::ZERO,
            resumed_at: None,
            source: String::new(),
        })
    }
}

pub struct MemoryHandle {
    record: Arc<Mutex<HandleRecord>>,
    registry: Arc<Mutex<Registry>>,
    played: Duration,
    resumed_at: Option<Instant>,
    // mirrors `record.source` so `source()` can hand out a borrow
    source: String,
}

impl MemoryHandle {
    fn halt_clock(&mut self) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.played += resumed_at.elapsed();
        }
    }
}

impl PlaybackHandle for MemoryHandle {
    fn source(&self) -> &str {
        &self.source
    }

    fn bind(&mut self, track: &str) {
        self.source = track.to_string();
        self.played = Duration::ZERO;
        self.resumed_at = None;
        let mut record = lock(&self.record);
        record.source = track.to_string();
        record.paused = true;
        record.released = false;
    }

    fn play(&mut self) -> Result<(), AudioError> {
        lock(&self.record).play_attempts += 1;
        if self.source.is_empty() {
            return Err(AudioError::NoSource);
        }
        if lock(&self.registry).failing.contains(&self.source) {
            return Err(AudioError::TrackNotFound(self.source.clone()));
        }

        let mut record = lock(&self.record);
        record.paused = false;
        record.released = false;
        drop(record);
        if self.resumed_at.is_none() {
            self.resumed_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.halt_clock();
        lock(&self.record).paused = true;
    }

    fn stop(&mut self) {
        self.halt_clock();
        self.played = Duration::ZERO;
        let mut record = lock(&self.record);
        record.paused = true;
        record.released = true;
    }

    fn is_paused(&self) -> bool {
        lock(&self.record).paused
    }

    fn volume(&self) -> f32 {
        lock(&self.record).volume
    }

    fn set_volume(&mut self, volume: f32) {
        let mut record = lock(&self.record);
        record.volume = volume;
        record.volume_history.push(volume);
    }

    fn is_muted(&self) -> bool {
        lock(&self.record).muted
    }

    fn set_muted(&mut self, muted: bool) {
        lock(&self.record).muted = muted;
    }

    fn is_looping(&self) -> bool {
        lock(&self.record).looping
    }

    fn set_looping(&mut self, looping: bool) {
        lock(&self.record).looping = looping;
    }

    fn position(&self) -> Duration {
        self.played + self.resumed_at.map(|t| t.elapsed()).unwrap_or_default()
    }
}
