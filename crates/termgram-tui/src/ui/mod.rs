//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod compose;
mod dialogs;
mod help;
mod messages;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
};
use termgram_app::Focus;

use crate::App;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const COMPOSE_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(COMPOSE_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, compose_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, app, *main_area);
    compose::render(frame, app, *compose_area);
    status::render(frame, app, *status_area);

    if app.is_help_open() {
        help::render(frame, frame.area());
    }
}

/// Render the main area (dialog list + message viewer).
fn render_main_area(frame: &mut Frame, app: &App, area: Rect) {
    const DIALOG_LIST_WIDTH: u16 = 28;
    const VIEWER_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(DIALOG_LIST_WIDTH), Constraint::Min(VIEWER_MIN_WIDTH)])
        .split(area);

    let [dialogs_area, viewer_area] = chunks.as_ref() else {
        return;
    };

    dialogs::render(frame, app, *dialogs_area);
    messages::render(frame, app, *viewer_area);
}

/// Border style for a pane, highlighted when it has focus.
fn border_style(app: &App, pane: Focus) -> Style {
    if app.focus() == pane { Style::default().fg(Color::Cyan) } else { Style::default() }
}
