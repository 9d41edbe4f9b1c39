//! Step grid widget - one row per voice, playhead underneath

use std::ops::Range;

use bitstep::sequencing::{Composition, Voice};
use bitstep::STEP_COUNT;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const LABEL_WIDTH: u16 = 10;
const BAR_STEPS: usize = 16;

/// Steps drawn by one column when `columns` share the whole pattern.
fn column_steps(column: usize, columns: usize) -> Range<usize> {
    let columns = columns.clamp(1, STEP_COUNT);
    let start = column * STEP_COUNT / columns;
    let end = ((column + 1) * STEP_COUNT / columns).max(start + 1);
    start..end.min(STEP_COUNT)
}

fn voice_color(voice: Voice) -> Color {
    match voice {
        Voice::Lead => Color::Cyan,
        Voice::Bass => Color::Magenta,
        Voice::Arp => Color::Green,
        Voice::Percussion => Color::Yellow,
    }
}

fn label(composition: &Composition, voice: Voice, selected: bool) -> Span<'static> {
    let settings = composition.settings(voice);
    let flags = match (settings.muted, settings.solo) {
        (true, _) => "M",
        (false, true) => "S",
        (false, false) => " ",
    };
    let cursor = if selected { '>' } else { ' ' };
    let text = format!("{cursor}{:<6}{flags} ", voice.label());
    let mut style = Style::default().fg(if composition.is_audible(voice) {
        Color::White
    } else {
        Color::DarkGray
    });
    if selected {
        style = style.add_modifier(Modifier::BOLD);
    }
    Span::styled(text, style)
}

/// Render the pattern grid with playhead
pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    composition: &Composition,
    playhead: Option<usize>,
    selected: Voice,
) {
    let block = Block::default().title(" Pattern ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 || inner.width <= LABEL_WIDTH {
        return;
    }

    let columns = usize::from(inner.width - LABEL_WIDTH).min(STEP_COUNT);
    let mut lines = Vec::with_capacity(Voice::ALL.len() + 2);

    let ruler: String = (0..columns)
        .map(|column| {
            let steps = column_steps(column, columns);
            if steps.clone().any(|step| step % BAR_STEPS == 0) {
                '|'
            } else {
                ' '
            }
        })
        .collect();
    lines.push(Line::from(vec![
        Span::raw(" ".repeat(usize::from(LABEL_WIDTH))),
        Span::styled(ruler, Style::default().fg(Color::DarkGray)),
    ]));

    for voice in Voice::ALL {
        let row = composition.pattern.row(voice);
        let cells: String = (0..columns)
            .map(|column| {
                if column_steps(column, columns).any(|step| !row[step].is_empty()) {
                    '▓'
                } else {
                    '░'
                }
            })
            .collect();
        let color = if composition.is_audible(voice) {
            voice_color(voice)
        } else {
            Color::DarkGray
        };
        lines.push(Line::from(vec![
            label(composition, voice, voice == selected),
            Span::styled(cells, Style::default().fg(color)),
        ]));
    }

    if let Some(step) = playhead {
        let marker: String = (0..columns)
            .map(|column| {
                if column_steps(column, columns).contains(&step) {
                    '▲'
                } else {
                    ' '
                }
            })
            .collect();
        lines.push(Line::from(vec![
            Span::raw(" ".repeat(usize::from(LABEL_WIDTH))),
            Span::styled(marker, Style::default().fg(Color::Yellow)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
