//! Dialog list
//!
//! Displays the dialog snapshot with unread counts and the selection.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};
use termgram_app::{App, Focus, format};

const SELECTED_SYMBOL: &str = "▶ ";

/// Render the dialog list.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.is_reloading() { " Dialogs (loading...) " } else { " Dialogs " };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(super::border_style(app, Focus::DialogList));

    if app.dialogs().is_empty() {
        let hint = if app.is_reloading() { "Loading..." } else { "No dialogs" };
        let items =
            vec![ListItem::new(Span::styled(hint, Style::default().fg(Color::DarkGray)))];
        frame.render_widget(List::new(items).block(block), area);
        return;
    }

    let items: Vec<ListItem> = app
        .dialogs()
        .iter()
        .map(|dialog| {
            let style = if dialog.unread > 0 {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(format::dialog_label(dialog), style)))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol(SELECTED_SYMBOL)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let mut state = ListState::default().with_selected(app.selected());
    frame.render_stateful_widget(list, area, &mut state);
}
