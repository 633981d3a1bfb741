//! Key binding overlay

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use termgram_app::keymap::KEY_BINDINGS;

const KEY_COLUMN_WIDTH: usize = 20;
const WIDTH: u16 = 66;

/// Render the help overlay centered over `area`.
pub fn render(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::raw("")];
    lines.extend(KEY_BINDINGS.iter().map(|(keys, description)| {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{keys:<KEY_COLUMN_WIDTH$}"), key_style),
            Span::raw(*description),
        ])
    }));

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let popup = centered_rect(WIDTH, height, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Keys ")
        .title_bottom(Line::from(" ? or Esc to close ").centered());
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
