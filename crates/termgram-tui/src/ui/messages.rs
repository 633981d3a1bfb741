//! Message viewer
//!
//! Displays the conversation window of the selected dialog, newest at the
//! bottom unless scrolled back.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use termgram_app::{App, Focus, format};

const BORDER_SIZE: u16 = 2;

/// Render the message viewer.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.selected_dialog() {
        Some(dialog) if app.is_fetching(dialog.id) => format!(" {} (loading...) ", dialog.name),
        Some(dialog) => format!(" {} ", dialog.name),
        None => " Messages ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(super::border_style(app, Focus::MessageViewer));

    let lines = match content(app) {
        Ok(lines) => lines,
        Err(hint) => vec![Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))],
    };

    let visible_height = usize::from(area.height.saturating_sub(BORDER_SIZE));
    let scroll = app.scroll().min(lines.len().saturating_sub(visible_height));
    let end = lines.len() - scroll;
    let start = end.saturating_sub(visible_height);
    let visible: Vec<_> = lines.into_iter().take(end).skip(start).collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);
}

/// Message lines of the open window, or a placeholder when there are none.
fn content(app: &App) -> Result<Vec<Line<'static>>, &'static str> {
    let Some(dialog) = app.selected_dialog() else {
        return Err("No dialog selected");
    };
    let window = app.window().filter(|w| w.dialog_id() == dialog.id);
    let Some(window) = window.filter(|w| w.is_loaded()) else {
        return Err(if app.is_fetching(dialog.id) { "Loading..." } else { "Press → to open" });
    };
    if window.messages().is_empty() {
        return Err("No messages yet");
    }

    let lines = window
        .messages()
        .iter()
        .flat_map(|message| {
            let style = if message.outgoing {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            format::message_lines(message)
                .into_iter()
                .map(move |line| Line::from(Span::styled(line, style)))
        })
        .collect();
    Ok(lines)
}
