use crate::shared::DisplayState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::grid::draw_note_grid;
use super::mode::TuiState;

const HELP: &str = "space play/stop  s stop  c clear  -/= tempo  1-3/tab scale  i instrument  \
[ ] attack  { } decay  e emotion  m mood  o open link  x share  g challenge  q quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport + sound settings
            Constraint::Min(10),   // note grid
            Constraint::Length(4), // status, share link
            Constraint::Length(1), // badges
            Constraint::Length(1), // prompt or key help
        ])
        .split(area);

    draw_header(frame, sections[0], state);
    draw_note_grid(frame, sections[1], state);
    draw_status(frame, sections[2], state);
    draw_badges(frame, sections[3], state);
    draw_footer(frame, sections[4], ts);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let transport = if state.playing {
        Span::styled("▶ playing", Style::default().fg(Color::LightGreen))
    } else {
        Span::styled("■ stopped", Style::default().fg(Color::Gray))
    };
    let line = Line::from(vec![
        transport,
        Span::raw(format!(
            "   {} bpm   {}   {}   attack {:.2}s   decay {:.2}s",
            state.tempo, state.scale, state.instrument, state.attack, state.decay
        )),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" melodygrid ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mut lines = vec![Line::from(state.display_text.as_str())];
    if let Some(link) = &state.share_link {
        lines.push(Line::from(Span::styled(link.as_str(), Style::default().fg(Color::Cyan))));
    }
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_badges(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let spans: Vec<Span> = state
        .badges
        .iter()
        .map(|(badge, unlocked)| {
            let style = if *unlocked {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" [{}] ", badge.label()), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, ts: &TuiState) {
    let line = match &ts.prompt {
        Some(p) => Line::from(vec![
            Span::styled(format!("{}: ", p.kind.label()), Style::default().fg(Color::LightMagenta)),
            Span::raw(format!("{}_", p.text)),
        ]),
        None => Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(Paragraph::new(line), area);
}
