//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.
//! Every service call originates here; the App itself performs no I/O.

use termgram_client::{DialogId, MessageId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Reload the dialog list.
    ReloadDialogs,

    /// Fetch a page of history.
    FetchHistory {
        /// Dialog to fetch from.
        dialog_id: DialogId,
        /// Only messages older than this. `None` for the most recent page.
        before: Option<MessageId>,
        /// Page size.
        limit: usize,
    },

    /// Send a message.
    SendMessage {
        /// Target dialog.
        dialog_id: DialogId,
        /// Trimmed, non-empty message text.
        text: String,
    },
}
