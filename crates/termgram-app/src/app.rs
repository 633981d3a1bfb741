//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the client completely decoupled from I/O and the messaging
//! backend.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Tracks the dialog list, the selection and which pane has focus.
//! - Owns the [`ConversationWindow`] of the open dialog and the compose buffer.
//! - Serializes service calls: one reload, and per dialog one history fetch
//!   and one send. Triggers arriving while the matching flag is set are
//!   dropped.
//! - Turns every failure into a status line message.

use std::collections::{HashMap, HashSet};

use termgram_client::{
    ClientError, Dialog, DialogId, HISTORY_PAGE_SIZE, Message, MessageId, validate_text,
};
use tracing::{debug, warn};

use crate::{AppAction, AppEvent, ComposeBuffer, ConversationWindow, Focus, KeyInput, format};

/// Screen rows not used for message lines: compose box, status line and the
/// viewer's borders.
const VIEWER_CHROME_ROWS: u16 = 6;

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable without a terminal or backend.
#[derive(Debug, Clone)]
pub struct App {
    /// Dialog snapshot from the last successful reload.
    dialogs: Vec<Dialog>,
    /// Index into `dialogs`. `None` only when the list is empty.
    selected: Option<usize>,
    /// Pane receiving key input.
    focus: Focus,
    /// History of the open dialog. `None` until a dialog is opened.
    window: Option<ConversationWindow>,
    /// Text being composed.
    compose: ComposeBuffer,
    /// Dialog reload in flight.
    reloading: bool,
    /// Dialogs with a history fetch in flight.
    history_in_flight: HashSet<DialogId>,
    /// Dialogs with a send in flight, with the compose text that was sent.
    send_in_flight: HashMap<DialogId, String>,
    /// Message lines scrolled back from the newest one.
    scroll: usize,
    /// Key binding overlay shown.
    show_help: bool,
    /// Page size used when a dialog is first opened.
    initial_limit: usize,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create an App that loads `initial_limit` messages when a dialog opens.
    pub fn new(initial_limit: usize) -> Self {
        Self {
            dialogs: Vec::new(),
            selected: None,
            focus: Focus::DialogList,
            window: None,
            compose: ComposeBuffer::new(),
            reloading: false,
            history_in_flight: HashSet::new(),
            send_in_flight: HashMap::new(),
            scroll: 0,
            show_help: false,
            initial_limit: initial_limit.max(1),
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Actions to run once before the first event: load the dialog list.
    pub fn start(&mut self) -> Vec<AppAction> {
        self.reloading = true;
        self.status_message = Some("Loading dialogs...".into());
        vec![AppAction::ReloadDialogs, AppAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::DialogsLoaded { result } => self.on_dialogs_loaded(result),
            AppEvent::HistoryLoaded { dialog_id, before, result } => {
                self.on_history_loaded(dialog_id, before, result)
            },
            AppEvent::MessageSent { dialog_id, result } => self.on_message_sent(dialog_id, result),
            AppEvent::Incoming(message) => self.on_incoming(message),
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Ctrl('c' | 'q') => return vec![AppAction::Quit],
            KeyInput::Ctrl('r') => return self.reload(),
            _ => {},
        }

        if self.show_help {
            if matches!(key, KeyInput::Char('?') | KeyInput::Esc) {
                self.show_help = false;
                return vec![AppAction::Render];
            }
            return vec![];
        }

        match self.focus {
            Focus::DialogList => match key {
                KeyInput::Up => self.move_selection(-1),
                KeyInput::Down => self.move_selection(1),
                KeyInput::Right => self.open(Focus::MessageViewer),
                KeyInput::Enter | KeyInput::Tab => self.open(Focus::ComposeBox),
                KeyInput::Char('?') => self.open_help(),
                _ => vec![],
            },
            Focus::MessageViewer => match key {
                KeyInput::Up => self.scroll_by(1),
                KeyInput::Down => self.scroll_by(-1),
                KeyInput::PageUp => self.scroll_by(self.page_rows()),
                KeyInput::PageDown => self.scroll_by(-self.page_rows()),
                KeyInput::Home => self.scroll_by(isize::MAX),
                KeyInput::End => self.scroll_by(isize::MIN),
                KeyInput::Char('?') => self.open_help(),
                KeyInput::Ctrl('y') => self.fetch_older(),
                KeyInput::Enter | KeyInput::Tab => self.open(Focus::ComposeBox),
                KeyInput::Esc | KeyInput::Left => self.focus_back(),
                _ => vec![],
            },
            Focus::ComposeBox => self.handle_compose_key(key),
        }
    }

    fn handle_compose_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Enter => return self.submit(),
            KeyInput::Esc => return self.focus_back(),
            KeyInput::Char(c) => self.compose.insert(c),
            KeyInput::Backspace => self.compose.backspace(),
            KeyInput::Delete => self.compose.delete(),
            KeyInput::Left => self.compose.move_left(),
            KeyInput::Right => self.compose.move_right(),
            KeyInput::Home => self.compose.move_home(),
            KeyInput::End => self.compose.move_end(),
            KeyInput::Tab
            | KeyInput::Up
            | KeyInput::Down
            | KeyInput::PageUp
            | KeyInput::PageDown
            | KeyInput::Ctrl(_) => return vec![],
        }
        vec![AppAction::Render]
    }

    /// Request a dialog reload unless one is already running.
    pub fn reload(&mut self) -> Vec<AppAction> {
        if self.reloading {
            debug!("reload already in flight, dropping trigger");
            return vec![];
        }
        self.reloading = true;
        self.status_message = Some("Reloading dialogs...".into());
        vec![AppAction::ReloadDialogs, AppAction::Render]
    }

    fn move_selection(&mut self, delta: isize) -> Vec<AppAction> {
        let Some(current) = self.selected else {
            return vec![];
        };
        let last = self.dialogs.len().saturating_sub(1);
        let next = current.saturating_add_signed(delta).min(last);
        if next == current {
            return vec![];
        }

        self.selected = Some(next);
        let next_id = self.dialogs.get(next).map(|d| d.id);
        if self.window.as_ref().map(ConversationWindow::dialog_id) != next_id {
            self.replace_window(None);
        }
        vec![AppAction::Render]
    }

    fn open_help(&mut self) -> Vec<AppAction> {
        self.show_help = true;
        vec![AppAction::Render]
    }

    /// Scroll the viewer `delta` lines toward older messages (negative is
    /// toward newer), clamped so the oldest line stays on screen.
    fn scroll_by(&mut self, delta: isize) -> Vec<AppAction> {
        let max = self.window_lines().saturating_sub(usize::from(self.viewer_rows()));
        let next = self.scroll.saturating_add_signed(delta).min(max);
        if next == self.scroll {
            return vec![];
        }
        self.scroll = next;
        vec![AppAction::Render]
    }

    /// Message lines that fit in the viewer at the current terminal size.
    fn viewer_rows(&self) -> u16 {
        self.terminal_size.1.saturating_sub(VIEWER_CHROME_ROWS).max(1)
    }

    fn page_rows(&self) -> isize {
        isize::try_from(self.viewer_rows()).unwrap_or(1)
    }

    /// Rendered line count of the window.
    fn window_lines(&self) -> usize {
        self.window.as_ref().map_or(0, |w| w.messages().iter().map(line_count).sum())
    }

    fn replace_window(&mut self, window: Option<ConversationWindow>) {
        self.window = window;
        self.scroll = 0;
    }

    fn focus_back(&mut self) -> Vec<AppAction> {
        self.focus = self.focus.back();
        vec![AppAction::Render]
    }

    /// Move focus to `target`, loading the selected dialog if needed.
    fn open(&mut self, target: Focus) -> Vec<AppAction> {
        if self.selected.is_none() {
            self.status_message = Some("No dialog selected".into());
            return vec![AppAction::Render];
        }
        self.focus = target;
        let mut actions = self.ensure_window();
        actions.push(AppAction::Render);
        actions
    }

    /// Make sure the window shows the selected dialog and its first page is
    /// loaded or on its way.
    fn ensure_window(&mut self) -> Vec<AppAction> {
        let Some(dialog_id) = self.selected_dialog().map(|d| d.id) else {
            return vec![];
        };

        let showing = self.window.as_ref().is_some_and(|w| w.dialog_id() == dialog_id);
        if !showing {
            self.replace_window(Some(ConversationWindow::new(dialog_id)));
            if let Some(dialog) = self.dialogs.iter_mut().find(|d| d.id == dialog_id) {
                dialog.unread = 0;
            }
        }

        if self.window.as_ref().is_some_and(ConversationWindow::is_loaded) {
            return vec![];
        }
        if !self.history_in_flight.insert(dialog_id) {
            debug!(dialog_id, "history fetch already in flight, dropping trigger");
            return vec![];
        }
        vec![AppAction::FetchHistory { dialog_id, before: None, limit: self.initial_limit }]
    }

    fn fetch_older(&mut self) -> Vec<AppAction> {
        let Some(window) = &self.window else {
            return vec![];
        };
        let dialog_id = window.dialog_id();

        if !window.is_loaded() || self.history_in_flight.contains(&dialog_id) {
            debug!(dialog_id, "history fetch already in flight, dropping trigger");
            return vec![];
        }

        let before = match window.oldest() {
            Some(oldest) if !window.is_exhausted() => oldest,
            _ => {
                self.status_message = Some("No more history".into());
                return vec![AppAction::Render];
            },
        };

        self.history_in_flight.insert(dialog_id);
        self.status_message = Some("Loading older messages...".into());
        vec![
            AppAction::FetchHistory { dialog_id, before: Some(before), limit: HISTORY_PAGE_SIZE },
            AppAction::Render,
        ]
    }

    fn submit(&mut self) -> Vec<AppAction> {
        let Some(dialog_id) = self.selected_dialog().map(|d| d.id) else {
            self.status_message = Some("Choose a dialog before sending messages".into());
            return vec![AppAction::Render];
        };

        let text = match validate_text(self.compose.text()) {
            Ok(text) => text.to_owned(),
            Err(err) => {
                self.status_message = Some(err.to_string());
                return vec![AppAction::Render];
            },
        };

        if self.send_in_flight.contains_key(&dialog_id) {
            debug!(dialog_id, "send already in flight, dropping trigger");
            return vec![];
        }
        self.send_in_flight.insert(dialog_id, self.compose.text().to_owned());

        self.status_message = Some("Sending...".into());
        vec![AppAction::SendMessage { dialog_id, text }, AppAction::Render]
    }

    fn on_dialogs_loaded(&mut self, result: Result<Vec<Dialog>, ClientError>) -> Vec<AppAction> {
        self.reloading = false;

        let dialogs = match result {
            Ok(dialogs) => dialogs,
            Err(err) => {
                warn!(error = %err, "dialog reload failed");
                self.status_message = Some(format!("Could not load dialogs: {err}"));
                return vec![AppAction::Render];
            },
        };

        let previous = self.selected_dialog().map(|d| d.id);
        self.dialogs = dialogs;
        self.selected = previous
            .and_then(|id| self.dialogs.iter().position(|d| d.id == id))
            .or(if self.dialogs.is_empty() { None } else { Some(0) });
        self.status_message = if self.dialogs.is_empty() {
            Some("No dialogs found".into())
        } else {
            None
        };

        let current = self.selected_dialog().map(|d| d.id);
        let mut actions = Vec::new();
        match (self.window.as_ref().map(ConversationWindow::dialog_id), current) {
            (Some(open), Some(selected)) if open == selected => {
                if let Some(dialog) = self.dialogs.iter_mut().find(|d| d.id == open) {
                    dialog.unread = 0;
                }
            },
            (_, None) => {
                self.replace_window(None);
                self.focus = Focus::DialogList;
            },
            (_, Some(_)) => {
                self.replace_window(None);
                if self.focus != Focus::DialogList {
                    actions = self.ensure_window();
                }
            },
        }

        actions.push(AppAction::Render);
        actions
    }

    fn on_history_loaded(
        &mut self,
        dialog_id: DialogId,
        before: Option<MessageId>,
        result: Result<Vec<Message>, ClientError>,
    ) -> Vec<AppAction> {
        self.history_in_flight.remove(&dialog_id);

        let Some(window) = self.window.as_mut().filter(|w| w.dialog_id() == dialog_id) else {
            debug!(dialog_id, "dropping history for a dialog no longer shown");
            return vec![];
        };
        if before.is_some() && !window.is_loaded() {
            // The first-page fetch of the reopened window was dropped while
            // this one was in flight, so issue it now.
            debug!(dialog_id, "dropping older page for a reopened dialog");
            let mut actions = self.ensure_window();
            actions.push(AppAction::Render);
            return actions;
        }

        match result {
            Ok(page) => {
                let older = before.is_some();
                let added = window.apply_page(before, page);
                self.status_message = if older && added == 0 {
                    Some("No more history".into())
                } else {
                    None
                };
            },
            Err(err) => {
                warn!(dialog_id, error = %err, "history fetch failed");
                self.status_message = Some(format!("Could not load history: {err}"));
            },
        }
        vec![AppAction::Render]
    }

    fn on_message_sent(
        &mut self,
        dialog_id: DialogId,
        result: Result<Message, ClientError>,
    ) -> Vec<AppAction> {
        let sent_text = self.send_in_flight.remove(&dialog_id);

        match result {
            Ok(message) => {
                // Text typed while the send was running is kept
                if sent_text.as_deref() == Some(self.compose.text()) {
                    self.compose.clear();
                }
                self.status_message = None;
                self.record_preview(&message);
                self.push_to_window(message);
            },
            Err(err) => {
                warn!(dialog_id, error = %err, "send failed");
                self.status_message = Some(format!("Send failed: {err}"));
            },
        }
        vec![AppAction::Render]
    }

    fn on_incoming(&mut self, message: Message) -> Vec<AppAction> {
        self.record_preview(&message);

        let open = self.window.as_ref().is_some_and(|w| w.dialog_id() == message.dialog_id);
        if open {
            self.push_to_window(message);
        } else if let Some(dialog) = self.dialogs.iter_mut().find(|d| d.id == message.dialog_id) {
            dialog.unread = dialog.unread.saturating_add(1);
        } else {
            debug!(dialog_id = message.dialog_id, "incoming message for unknown dialog");
        }
        vec![AppAction::Render]
    }

    /// Append to the open window, keeping a scrolled-back view in place.
    fn push_to_window(&mut self, message: Message) {
        let Some(window) = self.window.as_mut().filter(|w| w.dialog_id() == message.dialog_id)
        else {
            return;
        };
        let lines = line_count(&message);
        if window.push(message) && self.scroll > 0 {
            self.scroll = self.scroll.saturating_add(lines);
        }
    }

    fn record_preview(&mut self, message: &Message) {
        if let Some(dialog) = self.dialogs.iter_mut().find(|d| d.id == message.dialog_id) {
            let first_line = message.display_text().lines().next().unwrap_or_default();
            dialog.preview = Some(first_line.to_owned());
        }
    }

    /// Dialog snapshot in backend order.
    pub fn dialogs(&self) -> &[Dialog] {
        &self.dialogs
    }

    /// Selected index. `None` only when the list is empty.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selected dialog. `None` only when the list is empty.
    pub fn selected_dialog(&self) -> Option<&Dialog> {
        self.selected.and_then(|i| self.dialogs.get(i))
    }

    /// Pane receiving key input.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// History of the open dialog.
    pub fn window(&self) -> Option<&ConversationWindow> {
        self.window.as_ref()
    }

    /// Compose buffer.
    pub fn compose(&self) -> &ComposeBuffer {
        &self.compose
    }

    /// Dialog reload in flight.
    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// History fetch in flight for `dialog_id`.
    pub fn is_fetching(&self, dialog_id: DialogId) -> bool {
        self.history_in_flight.contains(&dialog_id)
    }

    /// Send in flight for `dialog_id`.
    pub fn is_sending(&self, dialog_id: DialogId) -> bool {
        self.send_in_flight.contains_key(&dialog_id)
    }

    /// Message lines the viewer is scrolled back from the newest one.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Key binding overlay shown.
    pub fn is_help_open(&self) -> bool {
        self.show_help
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

fn line_count(message: &Message) -> usize {
    format::message_lines(message).len()
}
