//! Transport bar widget - shows tempo, play state, step, era and audio stats

use bitstep::sequencing::Composition;
use bitstep::STEP_COUNT;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub struct TransportView<'a> {
    pub composition: &'a Composition,
    pub playing: bool,
    pub step: Option<usize>,
    pub style: Option<&'a str>,
    pub sample_rate: f32,
    pub seed: u64,
}

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, view: &TransportView, audio_stats: &AudioStats) {
    let title = match view.style {
        Some(style) => format!(" bitstep · {style} "),
        None => " bitstep ".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let play_symbol = if view.playing { "▶" } else { "⏸" };
    let play_state = if view.playing { "Playing" } else { "Stopped" };
    let step = view
        .step
        .map_or_else(|| "---".to_string(), |step| format!("{:03}", step + 1));
    let loop_state = if view.composition.looping { "loop" } else { "once" };

    let line = Line::from(vec![
        Span::styled(
            format!(" BPM: {:.0}  ", view.composition.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{play_symbol} {play_state}  "),
            Style::default().fg(if view.playing { Color::Green } else { Color::Yellow }),
        ),
        Span::styled(
            format!("Step {step}/{STEP_COUNT}  "),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{}  {loop_state}  ", view.composition.bit_mode.label()),
            Style::default().fg(Color::LightRed),
        ),
        Span::styled(
            format!("{:.1}kHz  seed {}  ", view.sample_rate / 1000.0, view.seed),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", audio_stats.peak, audio_stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
