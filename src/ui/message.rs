#[derive(Debug, Clone, PartialEq)]
pub enum AppMessage {
    Quit,
    /// Switch to the cue at this index; `None` is silence.
    SelectCue(Option<usize>),
    TogglePlayPause,
    ToggleMute,
    ToggleLoop,
    VolumeUp,
    VolumeDown,
}
