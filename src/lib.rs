pub mod audio;
pub mod cli;
pub mod ui;
pub mod util;
