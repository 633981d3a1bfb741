//! Observable application state types.
//!
//! This module defines the data structures that represent the application's
//! current view of the world: which pane has focus ([`Focus`]), the loaded
//! slice of the open dialog ([`ConversationWindow`]) and the text being
//! composed ([`ComposeBuffer`]).
//!
//! These structures serve as the "View Model" for the application. The
//! renderer reads them; only [`crate::App`] mutates them.

use termgram_client::{DialogId, Message, MessageId};

/// Pane receiving key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Dialog list on the left.
    #[default]
    DialogList,
    /// Message history of the selected dialog.
    MessageViewer,
    /// One-line compose box.
    ComposeBox,
}

impl Focus {
    /// Pane one level back toward the dialog list.
    pub fn back(self) -> Self {
        match self {
            Self::ComposeBox => Self::MessageViewer,
            Self::MessageViewer | Self::DialogList => Self::DialogList,
        }
    }
}

/// Loaded slice of one dialog's history.
///
/// Messages are kept in ascending id order without duplicates, whichever
/// order pages, sends and incoming messages arrive in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationWindow {
    dialog_id: DialogId,
    messages: Vec<Message>,
    loaded: bool,
    exhausted: bool,
}

impl ConversationWindow {
    /// Create an empty, not yet loaded window.
    pub fn new(dialog_id: DialogId) -> Self {
        Self { dialog_id, messages: Vec::new(), loaded: false, exhausted: false }
    }

    /// Dialog this window belongs to.
    pub fn dialog_id(&self) -> DialogId {
        self.dialog_id
    }

    /// Messages in ascending id order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether the first page has arrived.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether an older-history fetch came back empty.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Id of the oldest loaded message, the cursor for the next older page.
    pub fn oldest(&self) -> Option<MessageId> {
        self.messages.first().map(|m| m.id)
    }

    /// Merge a fetched page.
    ///
    /// `before` is the cursor the page was requested with. An empty page for
    /// an older-history request marks the window exhausted; a partial page
    /// does not. Returns the number of messages that were new.
    pub fn apply_page(&mut self, before: Option<MessageId>, page: Vec<Message>) -> usize {
        if before.is_none() {
            self.loaded = true;
        } else if page.is_empty() {
            self.exhausted = true;
        }

        let before_len = self.messages.len();
        for message in page {
            if !self.contains(message.id) {
                self.messages.push(message);
            }
        }
        self.messages.sort_by_key(|m| m.id);
        self.messages.len().saturating_sub(before_len)
    }

    /// Append one message. Returns `false` if a message with the same id is
    /// already present.
    pub fn push(&mut self, message: Message) -> bool {
        if self.contains(message.id) {
            return false;
        }
        let out_of_order = self.messages.last().is_some_and(|last| last.id > message.id);
        self.messages.push(message);
        if out_of_order {
            self.messages.sort_by_key(|m| m.id);
        }
        true
    }

    fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }
}

/// Text being composed, with a cursor.
///
/// The cursor counts characters, not bytes, so editing multi-byte text never
/// splits a code point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeBuffer {
    text: String,
    cursor: usize,
}

impl ComposeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True if the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor = self.cursor.saturating_add(1);
    }

    /// Remove the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.cursor.saturating_sub(1);
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Remove the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Move the cursor one character left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the cursor one character right.
    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor = self.cursor.saturating_add(1);
        }
    }

    /// Move the cursor to the start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor to the end.
    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Empty the buffer.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.text.char_indices().nth(chars).map_or(self.text.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn msg(id: MessageId) -> Message {
        Message {
            id,
            dialog_id: 1,
            sender: "Alice".into(),
            text: format!("m{id}"),
            timestamp: Utc.timestamp_opt(1_700_000_000 + id, 0).single().unwrap_or_default(),
            outgoing: false,
            has_media: false,
        }
    }

    #[test]
    fn focus_back_walks_toward_list() {
        assert_eq!(Focus::ComposeBox.back(), Focus::MessageViewer);
        assert_eq!(Focus::MessageViewer.back(), Focus::DialogList);
        assert_eq!(Focus::DialogList.back(), Focus::DialogList);
    }

    #[test]
    fn first_page_marks_loaded() {
        let mut window = ConversationWindow::new(1);
        assert!(!window.is_loaded());

        let added = window.apply_page(None, vec![msg(3), msg(4)]);

        assert_eq!(added, 2);
        assert!(window.is_loaded());
        assert_eq!(window.oldest(), Some(3));
    }

    #[test]
    fn older_page_prepends() {
        let mut window = ConversationWindow::new(1);
        window.apply_page(None, vec![msg(5), msg(6)]);
        window.apply_page(Some(5), vec![msg(3), msg(4)]);

        let ids: Vec<_> = window.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 4, 5, 6]);
        assert!(!window.is_exhausted());
    }

    #[test]
    fn empty_older_page_exhausts() {
        let mut window = ConversationWindow::new(1);
        window.apply_page(None, vec![msg(1)]);
        let added = window.apply_page(Some(1), vec![]);

        assert_eq!(added, 0);
        assert!(window.is_exhausted());
        assert_eq!(window.messages().len(), 1);
    }

    #[test]
    fn push_dedupes_and_orders() {
        let mut window = ConversationWindow::new(1);
        assert!(window.push(msg(2)));
        assert!(!window.push(msg(2)));
        assert!(window.push(msg(1)));

        let ids: Vec<_> = window.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn page_after_push_keeps_single_copy() {
        let mut window = ConversationWindow::new(1);
        window.push(msg(7));
        window.apply_page(None, vec![msg(6), msg(7)]);

        assert_eq!(window.messages().len(), 2);
    }

    #[test]
    fn compose_edits_multibyte() {
        let mut buffer = ComposeBuffer::new();
        for c in "héllo".chars() {
            buffer.insert(c);
        }
        buffer.move_left();
        buffer.move_left();
        buffer.move_left();
        buffer.backspace();

        assert_eq!(buffer.text(), "hllo");
        assert_eq!(buffer.cursor(), 1);

        buffer.insert('ä');
        buffer.delete();
        assert_eq!(buffer.text(), "hälo");
    }

    #[test]
    fn compose_cursor_bounds() {
        let mut buffer = ComposeBuffer::new();
        buffer.move_left();
        buffer.backspace();
        buffer.delete();
        assert_eq!(buffer.cursor(), 0);

        buffer.insert('a');
        buffer.insert('b');
        buffer.move_right();
        assert_eq!(buffer.cursor(), 2);

        buffer.move_home();
        assert_eq!(buffer.cursor(), 0);
        buffer.move_end();
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn blank_detection() {
        let mut buffer = ComposeBuffer::new();
        assert!(buffer.is_blank());
        buffer.insert(' ');
        buffer.insert('\t');
        assert!(buffer.is_blank());
        buffer.insert('x');
        assert!(!buffer.is_blank());
        buffer.clear();
        assert!(buffer.text().is_empty());
        assert_eq!(buffer.cursor(), 0);
    }
}
