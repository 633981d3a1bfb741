//! Status bar
//!
//! Displays the transient status message and key hints for the focused pane.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use termgram_app::keymap;

use crate::App;

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let status = match app.status_message() {
        Some(message) => Span::styled(
            message.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        None => Span::raw("Ready"),
    };

    let status_line = Line::from(vec![
        Span::raw(" "),
        status,
        Span::raw(" | "),
        Span::raw(keymap::hints(app.focus())),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
