//! Dialog and message value types.
//!
//! Backends convert their own shapes into these at the service boundary;
//! nothing downstream depends on a backend's concrete types.

use chrono::{DateTime, Utc};

/// Dialog identifier as assigned by the protocol.
pub type DialogId = i64;

/// Message identifier, unique and increasing within a dialog.
pub type MessageId = i64;

/// A conversation thread (direct chat or group).
///
/// Snapshot value: the whole list is replaced on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    /// Protocol identifier.
    pub id: DialogId,
    /// Display name.
    pub name: String,
    /// Text of the most recent message, if any.
    pub preview: Option<String>,
    /// Messages received but not yet viewed.
    pub unread: u32,
}

impl Dialog {
    /// Create a dialog with no preview and no unread messages.
    pub fn new(id: DialogId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), preview: None, unread: 0 }
    }
}

/// A single message in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Protocol identifier.
    pub id: MessageId,
    /// Dialog the message belongs to.
    pub dialog_id: DialogId,
    /// Display label of the author.
    pub sender: String,
    /// Text body. May be empty for media-only messages.
    pub text: String,
    /// Time the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Sent by the logged-in account.
    pub outgoing: bool,
    /// Message carries an attachment.
    pub has_media: bool,
}

impl Message {
    /// Body to display: the text, or a placeholder when there is none.
    pub fn display_text(&self) -> &str {
        if !self.text.is_empty() {
            &self.text
        } else if self.has_media {
            "<media>"
        } else {
            "<empty>"
        }
    }
}
