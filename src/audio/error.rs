use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AudioError {
    #[error("Audio output device error: {0}")]
    DeviceError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("No track bound to handle")]
    NoSource,

    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),
}
