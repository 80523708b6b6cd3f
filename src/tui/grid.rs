use crate::shared::{DisplayState, LedState, NUM_COLS, NUM_ROWS};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

const LABEL_WIDTH: u16 = 5;

// 8x8 cells, each row labelled with the pitch it plays in the current scale
pub fn draw_note_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let row_constraints = [Constraint::Ratio(1, NUM_ROWS as u32); NUM_ROWS];
    let mut col_constraints = vec![Constraint::Length(LABEL_WIDTH)];
    col_constraints.extend([Constraint::Ratio(1, NUM_COLS as u32); NUM_COLS]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (row_idx, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints.clone())
            .split(*row_area);

        let label = state
            .scale
            .pitch_for_row(row_idx)
            .map(|p| p.to_string())
            .unwrap_or_default();
        frame.render_widget(Paragraph::new(Line::from(label)).style(Style::default().fg(Color::Gray)), cols[0]);

        for (col_idx, cell_area) in cols[1..].iter().enumerate() {
            let mut style = match state.led(row_idx, col_idx) {
                LedState::Off => Style::default().fg(Color::DarkGray),
                LedState::Lit => Style::default().fg(Color::LightMagenta).bg(Color::Magenta),
                LedState::Playhead => Style::default().fg(Color::Gray).bg(Color::DarkGray),
                LedState::Struck => Style::default().fg(Color::White).bg(Color::LightMagenta),
            };
            let mut borders = Borders::NONE;
            if state.cursor == (row_idx, col_idx) {
                style = style.add_modifier(Modifier::BOLD);
                borders = Borders::ALL;
            }
            let block = Block::default()
                .borders(borders)
                .border_style(style)
                .style(style);
            frame.render_widget(block, *cell_area);
        }
    }
}
