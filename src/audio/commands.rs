#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    Play {
        track: String,
        volume: f32,
        looped: bool,
    },
    SetTargetVolume(f32),
    SetMute(bool),
    Stop,
}
