//! Compose box
//!
//! Displays the message being written, scrolled horizontally to keep the
//! cursor visible.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use termgram_app::{App, Focus};

const PROMPT: &str = "Message> ";
const PROMPT_WIDTH: u16 = 9;
const BORDER_SIZE: u16 = 2;
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border

/// Render the compose box.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(super::border_style(app, Focus::ComposeBox));

    let compose = app.compose();
    // One column stays free for the cursor after the last character.
    let width = usize::from(area.width.saturating_sub(BORDER_SIZE + PROMPT_WIDTH)).max(1);
    let skip = compose.cursor().saturating_sub(width - 1);
    let visible: String = compose.text().chars().skip(skip).take(width).collect();

    let paragraph = Paragraph::new(format!("{PROMPT}{visible}"))
        .style(Style::default().fg(Color::White))
        .block(block);
    frame.render_widget(paragraph, area);

    if app.focus() != Focus::ComposeBox {
        return;
    }

    let offset = u16::try_from(compose.cursor() - skip).unwrap_or(u16::MAX);
    let max_x = area.x.saturating_add(area.width).saturating_sub(BORDER_SIZE / 2 + 1);
    let cursor_x = area.x.saturating_add(1 + PROMPT_WIDTH).saturating_add(offset).min(max_x);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);

    frame.set_cursor_position((cursor_x, cursor_y));
}
