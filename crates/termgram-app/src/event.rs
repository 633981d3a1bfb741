//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User interactions (Keyboard, Resize) and system ticks.
//! - Service completions and incoming messages, delivered by the runtime.

use termgram_client::{ClientError, Dialog, DialogId, Message, MessageId};

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Dialog reload finished.
    DialogsLoaded {
        /// New dialog list, or the failure.
        result: Result<Vec<Dialog>, ClientError>,
    },

    /// History fetch finished.
    HistoryLoaded {
        /// Dialog the page belongs to.
        dialog_id: DialogId,
        /// Cursor the page was requested with.
        before: Option<MessageId>,
        /// Messages in ascending order, or the failure.
        result: Result<Vec<Message>, ClientError>,
    },

    /// Send finished.
    MessageSent {
        /// Dialog the message was sent to.
        dialog_id: DialogId,
        /// The sent message, or the failure.
        result: Result<Message, ClientError>,
    },

    /// Message arrived from another participant.
    Incoming(Message),

    /// Error occurred outside a specific request.
    Error {
        /// Error description.
        message: String,
    },
}
