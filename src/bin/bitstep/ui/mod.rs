//! TUI for bitstep
//!
//! Transport bar, the 4-voice step grid with playhead, an oscilloscope and
//! a status line. The UI only talks to the session; sound and scheduling run
//! on their own threads.

mod grid;
mod transport;
mod waveform;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use bitstep::engine::{AudioClock, FrameClock};
use bitstep::sequencing::{composition, Voice};
use bitstep::session::Notification;
use color_eyre::eyre::Result as EyreResult;
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use tracing::warn;

use super::app::LiveSession;
use grid::render_grid;
use transport::{render_transport, AudioStats, TransportView};
use waveform::render_waveform;

/// Oscilloscope window, in samples
const VIS_BUFFER_SIZE: usize = 1024;
const TEMPO_STEP: f64 = 5.0;
const EXPORT_PATH: &str = "bitstep-export.wav";

pub struct UiApp {
    session: LiveSession,
    clock: FrameClock,
    scope_rx: Consumer<f32>,
    notifications: Receiver<Notification>,
    audio_buffer: Vec<f32>,
    /// Steps scheduled but not yet audible, with their start times.
    upcoming: VecDeque<(usize, f64)>,
    /// Step currently sounding, for the playhead.
    sounding: Option<usize>,
    selected: usize,
    status: String,
    sample_rate: f32,
    seed: u64,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        session: LiveSession,
        clock: FrameClock,
        scope_rx: Consumer<f32>,
        sample_rate: f32,
        seed: u64,
    ) -> Self {
        let notifications = session.notifications();
        let status = match session.current() {
            Some(info) => format!("generated '{}' (seed {seed})", info.style),
            None => String::new(),
        };
        Self {
            session,
            clock,
            scope_rx,
            notifications,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            upcoming: VecDeque::new(),
            sounding: None,
            selected: 0,
            status,
            sample_rate,
            seed,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_notifications();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        self.session.stop();
        Ok(())
    }

    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.scope_rx.pop() {
            self.audio_buffer.push(sample);
            received = true;
        }
        if received && self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn poll_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            match notification {
                Notification::StepAdvanced { step, time } => self.upcoming.push_back((step, time)),
                Notification::PlaybackFinished => {
                    self.status = "end of pattern".into();
                }
                Notification::ExportComplete { path, summary } => {
                    self.status = format!("exported {} ({:.1} s)", path.display(), summary.seconds);
                }
                Notification::ExportFailed { path, error } => {
                    self.status = format!("export to {} failed: {error}", path.display());
                }
            }
        }

        // Steps are announced a lookahead early; show each once it sounds.
        let now = self.clock.now();
        while let Some(&(step, time)) = self.upcoming.front() {
            if time > now {
                break;
            }
            self.sounding = Some(step);
            self.upcoming.pop_front();
        }
        if !self.session.is_playing() && self.upcoming.is_empty() {
            self.sounding = None;
        }
    }

    fn selected_voice(&self) -> Voice {
        Voice::ALL[self.selected]
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => self.toggle_playback(),
            KeyCode::Char('g') => {
                let style = self
                    .session
                    .current()
                    .map(|info| info.style.clone())
                    .unwrap_or_default();
                let info = self.session.generate(&style);
                self.status = format!("regenerated '{}'", info.style);
            }
            KeyCode::Char('n') => {
                let current = self
                    .session
                    .current()
                    .map(|info| info.style.clone())
                    .unwrap_or_default();
                let next = self.session.library().next_preset(&current).name.clone();
                let info = self.session.generate(&next);
                self.status = format!("style '{}'", info.style);
            }
            KeyCode::Char('r') => {
                let info = self.session.randomize();
                self.status = format!(
                    "random: {} in {} {}, {} @ {}%",
                    info.style,
                    bitstep::theory::note_name(info.root + 60)
                        .trim_end_matches(char::is_numeric),
                    info.scale,
                    info.progression,
                    info.density
                );
            }
            KeyCode::Char('c') => {
                self.session.clear();
                self.status = "pattern cleared".into();
            }
            KeyCode::Char(c @ ('1' | '2' | '3')) => {
                let tier = match c {
                    '1' => 8,
                    '2' => 16,
                    _ => 32,
                };
                let mode = self.session.set_bit_mode(tier);
                self.status = format!("era {}", mode.label());
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_tempo(TEMPO_STEP),
            KeyCode::Char('-') => self.nudge_tempo(-TEMPO_STEP),
            KeyCode::Char('l') => {
                let looping = !composition::read(self.session.composition()).looping;
                self.session.set_looping(looping);
                self.status = if looping { "loop on" } else { "loop off" }.into();
            }
            KeyCode::Char('m') => {
                let voice = self.selected_voice();
                let muted = !composition::read(self.session.composition()).settings(voice).muted;
                self.session.set_muted(voice, muted);
            }
            KeyCode::Char('s') => {
                let voice = self.selected_voice();
                let solo = !composition::read(self.session.composition()).settings(voice).solo;
                self.session.set_solo(voice, solo);
            }
            KeyCode::Up => self.selected = (self.selected + Voice::ALL.len() - 1) % Voice::ALL.len(),
            KeyCode::Down => self.selected = (self.selected + 1) % Voice::ALL.len(),
            KeyCode::Char('e') => match self.session.export_to(PathBuf::from(EXPORT_PATH), None) {
                // The worker reports back through the notification channel.
                Ok(_handle) => self.status = format!("exporting {EXPORT_PATH}..."),
                Err(err) => self.status = format!("export refused: {err}"),
            },
            _ => {}
        }
    }

    fn toggle_playback(&mut self) {
        if self.session.is_playing() {
            self.session.stop();
            self.upcoming.clear();
            self.status = "stopped".into();
        } else {
            match self.session.play() {
                Ok(()) => self.status = "playing".into(),
                Err(err) => {
                    warn!(%err, "play refused");
                    self.status = format!("cannot play: {err}");
                }
            }
        }
    }

    fn nudge_tempo(&mut self, delta: f64) {
        let bpm = (self.session.tempo() + delta).clamp(40.0, 300.0);
        match self.session.set_tempo(bpm) {
            Ok(()) => self.status = format!("{bpm:.0} bpm"),
            Err(err) => self.status = err.to_string(),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Min(8),    // Step grid
                Constraint::Length(8), // Waveform
                Constraint::Length(1), // Status
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let snapshot = self.session.snapshot();
        let view = TransportView {
            composition: &snapshot,
            playing: self.session.is_playing(),
            step: self.sounding,
            style: self.session.current().map(|info| info.style.as_str()),
            sample_rate: self.sample_rate,
            seed: self.seed,
        };
        render_transport(frame, chunks[0], &view, &AudioStats::from_buffer(&self.audio_buffer));
        render_grid(frame, chunks[1], &snapshot, self.sounding, self.selected_voice());
        render_waveform(frame, chunks[2], &self.audio_buffer, snapshot.bit_mode);

        let status = Paragraph::new(format!(" {}", self.status))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(status, chunks[3]);

        let help = Paragraph::new(
            " [Space] Play/Stop  [G]en  [N]ext  [R]andom  [C]lear  [1/2/3] Era  [+/-] Tempo  \
             [L]oop  [M]ute  [S]olo  [↑/↓] Voice  [E]xport  [Q]uit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}
