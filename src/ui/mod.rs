pub mod app;
pub mod input;
pub mod message;
pub mod tui;
