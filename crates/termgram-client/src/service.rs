//! Conversation service contract.
//!
//! The [`ConversationService`] trait is the only way frontends talk to the
//! protocol client. All methods are async and return futures that are `Send`
//! so the runtime can run them on spawned tasks while it keeps handling keys.

use std::future::Future;

use tokio::{sync::mpsc, task::AbortHandle};

use crate::{ClientError, Dialog, DialogId, Message, MessageId};

/// Number of messages fetched per history page.
pub const HISTORY_PAGE_SIZE: usize = 25;

/// Dialogs, history, sending, and incoming messages.
pub trait ConversationService: Send + Sync + 'static {
    /// List dialogs in the order the protocol returns them.
    ///
    /// # Errors
    ///
    /// [`ClientError::Connection`] on transport failure.
    fn list_dialogs(&self) -> impl Future<Output = Result<Vec<Dialog>, ClientError>> + Send;

    /// Fetch up to `limit` messages older than `before`, ascending.
    ///
    /// With `before == None` the most recent `limit` messages are returned.
    /// An empty result means there is no more history.
    ///
    /// # Errors
    ///
    /// [`ClientError::Connection`] on transport failure,
    /// [`ClientError::Validation`] for an unknown dialog.
    fn fetch_history(
        &self,
        dialog_id: DialogId,
        before: Option<MessageId>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Message>, ClientError>> + Send;

    /// Send `text` to a dialog and return the sent message.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when `text` is blank (checked before any
    /// transport work), [`ClientError::Connection`] on transport failure.
    fn send_message(
        &self,
        dialog_id: DialogId,
        text: String,
    ) -> impl Future<Output = Result<Message, ClientError>> + Send;

    /// Subscribe to messages arriving from other participants.
    ///
    /// Must be called from within a tokio runtime.
    fn subscribe_incoming(&self) -> Subscription;

    /// Release the connection. Further calls may fail.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;
}

/// Reject blank message text.
///
/// Returns the text with surrounding whitespace removed.
pub fn validate_text(text: &str) -> Result<&str, ClientError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation("message text is empty".to_string()));
    }
    Ok(trimmed)
}

/// Handle to a running incoming-message subscription.
///
/// Messages are read with [`Subscription::recv`]. The producing task is
/// aborted by [`Subscription::stop`] or when the handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    messages: mpsc::Receiver<Message>,
    abort_handle: Option<AbortHandle>,
}

impl Subscription {
    /// Wrap a receiver fed by the task behind `abort_handle`.
    pub fn new(messages: mpsc::Receiver<Message>, abort_handle: AbortHandle) -> Self {
        Self { messages, abort_handle: Some(abort_handle) }
    }

    /// A subscription that never yields. For backends without push updates.
    pub fn empty() -> Self {
        let (_tx, messages) = mpsc::channel(1);
        Self { messages, abort_handle: None }
    }

    /// Next incoming message. `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<Message> {
        self.messages.recv().await
    }

    /// Cancel the subscription.
    pub fn stop(&mut self) {
        if let Some(handle) = self.abort_handle.take() {
            handle.abort();
        }
        self.messages.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
