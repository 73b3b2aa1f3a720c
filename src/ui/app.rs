use std::sync::Arc;

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};
use tracing::{info, warn};

use crate::{
    audio::{
        AudioCue, AudioOutput, AudioSystem, ChannelSnapshot, MemoryOutput, Phase, PlaybackEngine,
    },
    cli::Cli,
    ui::{
        input::InputHandler,
        message::AppMessage,
        tui::{TerminalEvent, Tui},
    },
    util::colors,
};

const VOLUME_STEP: f32 = 0.1;

pub struct App {
    // dropped before the engine so handles stop while the stream is still open
    audio: AudioSystem,
    _engine: Option<PlaybackEngine>,
    cues: Vec<AudioCue>,
    selected: Option<usize>,
    output_label: &'static str,
    pub should_quit: bool,
}

impl App {
    pub fn new(cli: &Cli) -> color_eyre::Result<Self> {
        let engine = if cli.silent {
            None
        } else {
            match PlaybackEngine::new() {
                Ok(engine) => Some(engine),
                Err(e) => {
                    warn!(error = %e, "audio_device_unavailable");
                    None
                }
            }
        };
        let output: Arc<dyn AudioOutput> = match &engine {
            Some(engine) => Arc::new(engine.output()?),
            None => Arc::new(MemoryOutput::new()),
        };
        let output_label = match (&engine, cli.silent) {
            (Some(_), _) => "device",
            (None, true) => "silent",
            (None, false) => "silent (no device)",
        };

        let audio = AudioSystem::new(output, cli.fade_config())?;
        info!(cues = cli.tracks.len(), output = output_label, "app_started");

        Ok(Self {
            audio,
            _engine: engine,
            cues: cli.cues(),
            selected: None,
            output_label,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        if !self.cues.is_empty() {
            self.update(AppMessage::SelectCue(Some(0)));
        }

        while !self.should_quit {
            tui.draw(|f| self.ui(f))?;

            match tui.next().await {
                Some(TerminalEvent::Key(key)) => {
                    if let Some(message) = InputHandler::handle_key(key) {
                        self.update(message);
                    }
                }
                Some(TerminalEvent::Tick | TerminalEvent::Resize(..)) => {}
                Some(TerminalEvent::Closed) | None => self.should_quit = true,
            }
        }

        tui.exit()?;
        Ok(())
    }

    pub fn update(&mut self, message: AppMessage) {
        match message {
            AppMessage::Quit => self.should_quit = true,
            AppMessage::SelectCue(index) => {
                if index.is_some_and(|i| i >= self.cues.len()) {
                    return;
                }
                self.selected = index;
                let muted = self.audio.is_muted();
                self.audio.sync(self.selected_cue(), true, muted);
            }
            AppMessage::TogglePlayPause => self.audio.toggle_playing(),
            AppMessage::ToggleMute => self.audio.toggle_mute(),
            AppMessage::ToggleLoop => self.edit_selected(|cue| cue.looped = !cue.looped),
            AppMessage::VolumeUp => {
                self.edit_selected(|cue| cue.volume = (cue.volume + VOLUME_STEP).min(1.0))
            }
            AppMessage::VolumeDown => {
                self.edit_selected(|cue| cue.volume = (cue.volume - VOLUME_STEP).max(0.0))
            }
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn cues(&self) -> &[AudioCue] {
        &self.cues
    }

    pub fn audio(&self) -> &AudioSystem {
        &self.audio
    }

    fn selected_cue(&self) -> AudioCue {
        self.selected
            .and_then(|i| self.cues.get(i).cloned())
            .unwrap_or_default()
    }

    fn edit_selected(&mut self, edit: impl FnOnce(&mut AudioCue)) {
        let Some(cue) = self.selected.and_then(|i| self.cues.get_mut(i)) else {
            return;
        };
        edit(cue);
        let cue = cue.clone();
        self.audio.set_cue(cue);
    }

    fn ui(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }

    fn cue_line(&self, key: char, label: &str, cue: Option<&AudioCue>, active: bool) -> Line<'static> {
        let marker = if active { "▶ " } else { "  " };
        let mut line = Line::default();
        line.push_span(Span::raw(marker));
        line.push_span(format!("[{key}] ").fg(colors::ACCENT));
        line.push_span(label.to_string());
        if let Some(cue) = cue {
            line.push_span(format!("  vol {:.2}", cue.volume).fg(colors::NEUTRAL));
            if cue.looped {
                line.push_span("  loop".fg(colors::NEUTRAL));
            }
        }
        if active {
            line = line.fg(colors::PRIMARY);
        }
        line
    }
}

fn channel_gauge<'a>(title: &'a str, channel: Option<&ChannelSnapshot>, fill: Color) -> Gauge<'a> {
    let (ratio, label) = match channel {
        Some(c) if !c.track.is_empty() => {
            let state = if c.paused { "paused" } else { "playing" };
            (
                f64::from(c.volume.clamp(0.0, 1.0)),
                format!("{} {:.2} {state}", c.track, c.volume),
            )
        }
        _ => (0.0, "-".to_string()),
    };

    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .title(title),
        )
        .gauge_style(Style::new().fg(fill).bg(colors::NEUTRAL))
        .ratio(ratio)
        .label(label)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        buf.set_style(area, Style::new().bg(colors::BACKGROUND));

        let snapshot = self.audio.snapshot();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        let mut lines = vec![self.cue_line('0', "silence", None, self.selected.is_none())];
        lines.extend(self.cues.iter().take(9).enumerate().map(|(i, cue)| {
            let key = char::from_digit(i as u32 + 1, 10).unwrap_or('?');
            self.cue_line(key, &cue.track, Some(cue), self.selected == Some(i))
        }));
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_set(border::ROUNDED)
                    .title_top("novel-audio")
                    .title_alignment(Alignment::Center),
            )
            .render(chunks[0], buf);

        let phase = match snapshot.phase {
            Phase::Idle => "idle".to_string(),
            Phase::Playing => "playing".to_string(),
            Phase::Transitioning { progress } => format!("crossfading {:.0}%", progress * 100.0),
        };
        let status = Line::from(vec![
            phase.fg(colors::PRIMARY),
            format!("  target {:.2}", snapshot.target_volume).into(),
            if snapshot.muted {
                "  muted".fg(colors::SECONDARY)
            } else {
                "".into()
            },
            if self.audio.is_playing() {
                "".into()
            } else {
                "  stopped".fg(colors::SECONDARY)
            },
            format!("  output: {}", self.output_label).fg(colors::NEUTRAL),
        ]);
        Paragraph::new(status)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_set(border::ROUNDED),
            )
            .render(chunks[1], buf);

        channel_gauge("current", Some(&snapshot.current), colors::PRIMARY).render(chunks[2], buf);
        channel_gauge("outgoing", snapshot.outgoing.as_ref(), colors::FADING).render(chunks[3], buf);

        Paragraph::new("0-9 cue  space play/stop  m mute  +/- volume  l loop  q quit")
            .fg(colors::NEUTRAL)
            .centered()
            .render(chunks[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn silent_app(tracks: &[&str]) -> App {
        let mut args = vec!["novel-audio", "--silent"];
        args.extend_from_slice(tracks);
        App::new(&Cli::try_parse_from(args).unwrap()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_cues_drives_the_controller() {
        let mut app = silent_app(&["a.mp3", "b.mp3"]);

        app.update(AppMessage::SelectCue(Some(1)));
        assert_eq!(app.selected(), Some(1));
        assert_eq!(app.audio().cue().track, "b.mp3");
        assert!(app.audio().is_playing());

        app.update(AppMessage::SelectCue(Some(5)));
        assert_eq!(app.selected(), Some(1));

        app.update(AppMessage::SelectCue(None));
        assert!(app.audio().cue().is_silence());
    }

    #[tokio::test(start_paused = true)]
    async fn volume_keys_edit_the_selected_cue() {
        let mut app = silent_app(&["a.mp3"]);
        app.update(AppMessage::SelectCue(Some(0)));

        app.update(AppMessage::VolumeDown);
        app.update(AppMessage::VolumeDown);
        assert!((app.cues()[0].volume - 0.8).abs() < 1e-6);
        assert!((app.audio().snapshot().target_volume - 0.8).abs() < 1e-6);

        app.update(AppMessage::VolumeUp);
        app.update(AppMessage::VolumeUp);
        app.update(AppMessage::VolumeUp);
        assert_eq!(app.cues()[0].volume, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn play_pause_and_mute_toggle() {
        let mut app = silent_app(&["a.mp3"]);
        app.update(AppMessage::SelectCue(Some(0)));

        app.update(AppMessage::TogglePlayPause);
        assert!(!app.audio().is_playing());
        assert_eq!(app.audio().snapshot().phase, Phase::Idle);

        app.update(AppMessage::ToggleMute);
        assert!(app.audio().snapshot().muted);

        app.update(AppMessage::Quit);
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_toggle_reaches_the_playing_handle() {
        let mut app = silent_app(&["a.mp3"]);
        app.update(AppMessage::SelectCue(Some(0)));
        assert!(app.audio().snapshot().current.looping);

        app.update(AppMessage::ToggleLoop);

        assert!(!app.cues()[0].looped);
        assert!(!app.audio().snapshot().current.looping);
        assert_eq!(app.audio().cue().track, "a.mp3");
    }

    #[tokio::test(start_paused = true)]
    async fn renders_cues_and_status() {
        let mut app = silent_app(&["a.mp3"]);
        app.update(AppMessage::SelectCue(Some(0)));

        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        (&app).render(area, &mut buf);

        let text: String = buf.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("a.mp3"));
        assert!(text.contains("crossfading"));
        assert!(text.contains("silent"));
    }
}
