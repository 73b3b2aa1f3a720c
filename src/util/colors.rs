use ratatui::style::Color;

// Warm stage palette: the incoming track is lit, the outgoing one dims.
pub const PRIMARY: Color = Color::from_u32(0x00e8b86d);
pub const SECONDARY: Color = Color::from_u32(0x00b05a4a);
pub const NEUTRAL: Color = Color::from_u32(0x003a3a44);
pub const BACKGROUND: Color = Color::from_u32(0x00101014);
pub const ACCENT: Color = Color::from_u32(0x009fc6c9);
pub const FADING: Color = Color::from_u32(0x007a6a58);
