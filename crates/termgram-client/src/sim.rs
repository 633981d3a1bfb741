//! In-process simulated backend.
//!
//! Implements [`ConversationService`] and [`Authenticator`] without a network:
//! dialogs and history live in memory, sends are stored locally, and
//! simulated peers answer through the incoming-message subscription after a
//! short delay. Latency and outages can be injected for testing.
//!
//! Used as the default backend of the terminal client and as the service
//! double in tests.

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};

use crate::{
    AuthFailure, AuthStep, Authenticator, ClientError, ConversationService, Dialog, DialogId,
    Message, MessageId, SessionStore, Subscription, validate_text,
};

/// Confirmation code accepted by the simulated login.
pub const SIM_LOGIN_CODE: &str = "12345";

/// Sender label used for the logged-in account.
const SELF_NAME: &str = "You";

/// Session tokens written by the simulated backend start with this prefix.
const TOKEN_PREFIX: &str = "sim:";

/// 2024-01-01 12:00:00 UTC. Seeded history starts here.
const SEED_EPOCH: i64 = 1_704_110_400;

/// Seconds between consecutive seeded messages.
const SEED_SPACING_SECS: i64 = 90;

const INCOMING_BUFFER: usize = 64;

const CANNED_REPLIES: &[&str] = &[
    "Got it!",
    "Sounds good to me.",
    "Ha, nice",
    "Let me check and get back to you.",
    "On my way",
    "Can we talk about this tomorrow?",
];

/// Simulated backend configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Where the session token is persisted. `None` keeps it in memory only.
    pub session_path: Option<PathBuf>,
    /// Code accepted by [`Authenticator::submit_code`].
    pub login_code: String,
    /// Two-factor password. `None` disables the password step.
    pub password: Option<String>,
    /// Delay applied to every transport call.
    pub latency: Duration,
    /// Delay before a peer answers a sent message. `None` disables replies.
    pub reply_delay: Option<Duration>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            session_path: None,
            login_code: SIM_LOGIN_CODE.to_string(),
            password: None,
            latency: Duration::ZERO,
            reply_delay: Some(Duration::from_millis(1500)),
        }
    }
}

/// Transport call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Calls to [`ConversationService::list_dialogs`].
    pub list_calls: usize,
    /// Calls to [`ConversationService::fetch_history`].
    pub history_calls: usize,
    /// Calls to [`ConversationService::send_message`] that passed validation.
    pub send_calls: usize,
}

/// In-memory backend implementing both client contracts.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SimBackend {
    inner: Arc<Inner>,
}

struct Inner {
    config: SimConfig,
    session: Option<SessionStore>,
    state: Mutex<SimState>,
    incoming: broadcast::Sender<Message>,
    offline: AtomicBool,
    authorized: AtomicBool,
    list_calls: AtomicUsize,
    history_calls: AtomicUsize,
    send_calls: AtomicUsize,
}

#[derive(Default)]
struct SimState {
    dialogs: Vec<SimDialog>,
    next_message_id: MessageId,
    login: LoginProgress,
}

struct SimDialog {
    dialog: Dialog,
    peers: Vec<String>,
    history: Vec<Message>,
}

#[derive(Debug, Default)]
enum LoginProgress {
    #[default]
    Idle,
    AwaitingCode {
        phone: String,
    },
    AwaitingPassword {
        phone: String,
    },
}

impl SimBackend {
    /// Backend with no dialogs and no logged-in session.
    pub fn new(config: SimConfig) -> Self {
        let session = config.session_path.clone().map(SessionStore::new);
        let (incoming, _) = broadcast::channel(INCOMING_BUFFER);
        let state = SimState { next_message_id: 1, ..SimState::default() };

        Self {
            inner: Arc::new(Inner {
                config,
                session,
                state: Mutex::new(state),
                incoming,
                offline: AtomicBool::new(false),
                authorized: AtomicBool::new(false),
                list_calls: AtomicUsize::new(0),
                history_calls: AtomicUsize::new(0),
                send_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Backend populated with a handful of demo dialogs.
    pub fn seeded(config: SimConfig) -> Self {
        let backend = Self::new(config);
        backend.with_state(seed);
        backend
    }

    /// Treat the session as already logged in.
    #[must_use]
    pub fn logged_in(self) -> Self {
        self.inner.authorized.store(true, Ordering::SeqCst);
        self
    }

    /// Add an empty dialog. `peers` answer messages sent to it.
    pub fn add_dialog(&self, id: DialogId, name: &str, peers: &[&str]) {
        self.with_state(|state| state.add_dialog(id, name, peers));
    }

    /// Append a message to history without notifying subscribers.
    pub fn push_history(
        &self,
        dialog_id: DialogId,
        sender: &str,
        text: &str,
        outgoing: bool,
    ) -> Option<Message> {
        self.with_state(|state| {
            let timestamp = seed_timestamp(state.next_message_id);
            state.append(dialog_id, sender, text, outgoing, false, timestamp)
        })
    }

    /// Deliver a message from a peer: stored, counted unread, and pushed to
    /// subscribers.
    pub fn inject_incoming(&self, dialog_id: DialogId, sender: &str, text: &str) -> Option<Message> {
        let message = self.with_state(|state| {
            let message = state.append(dialog_id, sender, text, false, false, Utc::now())?;
            if let Some(entry) = state.find_mut(dialog_id) {
                entry.dialog.unread = entry.dialog.unread.saturating_add(1);
            }
            state.bump(dialog_id);
            Some(message)
        })?;

        if self.inner.incoming.send(message.clone()).is_err() {
            tracing::trace!(dialog_id, "no incoming subscribers");
        }
        Some(message)
    }

    /// Simulate a network outage. Transport calls fail while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Transport call counters.
    pub fn stats(&self) -> SimStats {
        SimStats {
            list_calls: self.inner.list_calls.load(Ordering::SeqCst),
            history_calls: self.inner.history_calls.load(Ordering::SeqCst),
            send_calls: self.inner.send_calls.load(Ordering::SeqCst),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Apply latency and outage simulation.
    async fn transport(&self) -> Result<(), ClientError> {
        let latency = self.inner.config.latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Connection("network unreachable".to_string()));
        }
        Ok(())
    }

    fn require_authorized(&self) -> Result<(), ClientError> {
        if self.inner.authorized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthFailure::Unauthorized.into())
        }
    }

    fn schedule_reply(&self, dialog_id: DialogId, seed: MessageId, delay: Duration) {
        let backend = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let peer = backend.with_state(|state| {
                let entry = state.find_mut(dialog_id)?;
                let index = seed.unsigned_abs() as usize % entry.peers.len().max(1);
                entry.peers.get(index).cloned()
            });
            let Some(peer) = peer else {
                return;
            };

            let text = CANNED_REPLIES[seed.unsigned_abs() as usize % CANNED_REPLIES.len()];
            if backend.inject_incoming(dialog_id, &peer, text).is_none() {
                tracing::debug!(dialog_id, "reply target vanished");
            }
        });
    }

    async fn complete_login(&self, phone: String) -> Result<(), ClientError> {
        self.inner.authorized.store(true, Ordering::SeqCst);
        self.with_state(|state| state.login = LoginProgress::Idle);
        if let Some(session) = &self.inner.session {
            session.save(&format!("{TOKEN_PREFIX}{phone}")).await?;
        }
        tracing::info!("simulated login complete");
        Ok(())
    }
}

impl ConversationService for SimBackend {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>, ClientError> {
        self.inner.list_calls.fetch_add(1, Ordering::SeqCst);
        self.transport().await?;
        self.require_authorized()?;

        Ok(self.with_state(|state| state.dialogs.iter().map(|d| d.dialog.clone()).collect()))
    }

    async fn fetch_history(
        &self,
        dialog_id: DialogId,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, ClientError> {
        self.inner.history_calls.fetch_add(1, Ordering::SeqCst);
        self.transport().await?;
        self.require_authorized()?;

        self.with_state(|state| {
            let entry = state.find_mut(dialog_id).ok_or_else(|| unknown_dialog(dialog_id))?;
            let older: Vec<Message> = entry
                .history
                .iter()
                .filter(|m| before.is_none_or(|before| m.id < before))
                .cloned()
                .collect();
            let page = older[older.len().saturating_sub(limit)..].to_vec();

            if before.is_none() {
                entry.dialog.unread = 0;
            }
            Ok(page)
        })
    }

    async fn send_message(&self, dialog_id: DialogId, text: String) -> Result<Message, ClientError> {
        let text = validate_text(&text)?.to_string();
        self.inner.send_calls.fetch_add(1, Ordering::SeqCst);
        self.transport().await?;
        self.require_authorized()?;

        let (message, has_peers) = self.with_state(|state| {
            let message = state
                .append(dialog_id, SELF_NAME, &text, true, false, Utc::now())
                .ok_or_else(|| unknown_dialog(dialog_id))?;
            let has_peers = state.find_mut(dialog_id).is_some_and(|d| !d.peers.is_empty());
            state.bump(dialog_id);
            Ok::<_, ClientError>((message, has_peers))
        })?;

        if has_peers && let Some(delay) = self.inner.config.reply_delay {
            self.schedule_reply(dialog_id, message.id, delay);
        }
        Ok(message)
    }

    fn subscribe_incoming(&self) -> Subscription {
        let mut source = self.inner.incoming.subscribe();
        let (tx, rx) = mpsc::channel(INCOMING_BUFFER);

        let task = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "incoming subscriber lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Subscription::new(rx, task.abort_handle())
    }

    async fn disconnect(&self) {
        tracing::info!(stats = ?self.stats(), "simulated backend disconnected");
    }
}

impl Authenticator for SimBackend {
    async fn is_authorized(&self) -> Result<bool, ClientError> {
        if self.inner.authorized.load(Ordering::SeqCst) {
            return Ok(true);
        }

        let Some(session) = &self.inner.session else {
            return Ok(false);
        };
        let resumed = session.load().await?.is_some_and(|token| token.starts_with(TOKEN_PREFIX));
        if resumed {
            tracing::info!(path = %session.path().display(), "resumed persisted session");
            self.inner.authorized.store(true, Ordering::SeqCst);
        }
        Ok(resumed)
    }

    async fn login(&self, phone: &str) -> Result<AuthStep, ClientError> {
        self.transport().await?;

        let phone = phone.trim();
        if !is_valid_phone(phone) {
            return Err(AuthFailure::InvalidPhone.into());
        }

        self.with_state(|state| {
            state.login = LoginProgress::AwaitingCode { phone: phone.to_string() };
        });
        tracing::info!(code = %self.inner.config.login_code, "simulated login code sent");
        Ok(AuthStep::CodeRequired)
    }

    async fn submit_code(&self, code: &str) -> Result<AuthStep, ClientError> {
        self.transport().await?;

        let config = &self.inner.config;
        let outcome = self.with_state(|state| match std::mem::take(&mut state.login) {
            LoginProgress::AwaitingCode { phone } => {
                if code.trim() != config.login_code {
                    state.login = LoginProgress::AwaitingCode { phone };
                    return Err(ClientError::from(AuthFailure::InvalidCode));
                }
                if config.password.is_some() {
                    state.login = LoginProgress::AwaitingPassword { phone };
                    Ok(None)
                } else {
                    Ok(Some(phone))
                }
            },
            other => {
                state.login = other;
                Err(AuthFailure::UnexpectedStep.into())
            },
        })?;

        match outcome {
            Some(phone) => {
                self.complete_login(phone).await?;
                Ok(AuthStep::Authenticated)
            },
            None => Ok(AuthStep::PasswordRequired),
        }
    }

    async fn submit_password(&self, password: &str) -> Result<(), ClientError> {
        self.transport().await?;

        let expected = self.inner.config.password.as_deref();
        let phone = self.with_state(|state| match std::mem::take(&mut state.login) {
            LoginProgress::AwaitingPassword { phone } => {
                if expected == Some(password) {
                    Ok(phone)
                } else {
                    state.login = LoginProgress::AwaitingPassword { phone };
                    Err(ClientError::from(AuthFailure::InvalidCredentials))
                }
            },
            other => {
                state.login = other;
                Err(AuthFailure::UnexpectedStep.into())
            },
        })?;

        self.complete_login(phone).await
    }
}

impl SimState {
    fn add_dialog(&mut self, id: DialogId, name: &str, peers: &[&str]) {
        if self.find_mut(id).is_some() {
            return;
        }
        self.dialogs.push(SimDialog {
            dialog: Dialog::new(id, name),
            peers: peers.iter().map(|p| (*p).to_string()).collect(),
            history: Vec::new(),
        });
    }

    fn find_mut(&mut self, id: DialogId) -> Option<&mut SimDialog> {
        self.dialogs.iter_mut().find(|d| d.dialog.id == id)
    }

    fn append(
        &mut self,
        dialog_id: DialogId,
        sender: &str,
        text: &str,
        outgoing: bool,
        has_media: bool,
        timestamp: DateTime<Utc>,
    ) -> Option<Message> {
        let id = self.next_message_id;
        let entry = self.dialogs.iter_mut().find(|d| d.dialog.id == dialog_id)?;

        let message = Message {
            id,
            dialog_id,
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp,
            outgoing,
            has_media,
        };
        entry.dialog.preview = Some(message.display_text().to_string());
        entry.history.push(message.clone());
        self.next_message_id = id + 1;
        Some(message)
    }

    /// Move a dialog to the front, as the most recently active.
    fn bump(&mut self, dialog_id: DialogId) {
        if let Some(index) = self.dialogs.iter().position(|d| d.dialog.id == dialog_id) {
            let entry = self.dialogs.remove(index);
            self.dialogs.insert(0, entry);
        }
    }
}

fn seed(state: &mut SimState) {
    state.add_dialog(1, "Saved Messages", &[]);
    state.add_dialog(2, "Alice", &["Alice"]);
    state.add_dialog(3, "Bob", &["Bob"]);
    state.add_dialog(4, "Rust Club", &["Ferris", "Corro", "Ada"]);

    for text in ["Groceries: oat milk, coffee, rice", "Book dentist appointment", "Trip ideas"] {
        seed_message(state, 1, SELF_NAME, text, true, false);
    }

    let alice_lines = [
        "Hey! Are we still on for Saturday?",
        "Yes, 10am at the station",
        "Perfect. Should I bring anything?",
        "Just snacks and good shoes",
        "Deal",
        "Did you see the weather forecast?",
    ];
    for i in 0..60 {
        let outgoing = i % 2 == 1;
        let sender = if outgoing { SELF_NAME } else { "Alice" };
        seed_message(state, 2, sender, alice_lines[i % alice_lines.len()], outgoing, false);
    }

    seed_message(state, 3, "Bob", "Check out this photo", false, false);
    seed_message(state, 3, "Bob", "", false, true);
    seed_message(state, 3, SELF_NAME, "Wow, where is that?", true, false);
    seed_message(state, 3, "Bob", "Lake Bled.\nTook the early train.", false, false);

    let club = [
        ("Ferris", "Meetup moved to Thursday"),
        ("Corro", "Who is giving the async talk?"),
        ("Ada", "I can do it"),
        ("Ferris", "Great, slides by Wednesday please"),
    ];
    for _ in 0..3 {
        for (sender, text) in club {
            seed_message(state, 4, sender, text, false, false);
        }
    }

    if let Some(entry) = state.find_mut(2) {
        entry.dialog.unread = 2;
    }
    if let Some(entry) = state.find_mut(4) {
        entry.dialog.unread = 5;
    }
}

fn seed_message(
    state: &mut SimState,
    dialog_id: DialogId,
    sender: &str,
    text: &str,
    outgoing: bool,
    has_media: bool,
) {
    let timestamp = seed_timestamp(state.next_message_id);
    if state.append(dialog_id, sender, text, outgoing, has_media, timestamp).is_none() {
        tracing::warn!(dialog_id, "seed message for unknown dialog");
    }
}

fn seed_timestamp(id: MessageId) -> DateTime<Utc> {
    DateTime::from_timestamp(SEED_EPOCH + id * SEED_SPACING_SECS, 0).unwrap_or_default()
}

fn unknown_dialog(dialog_id: DialogId) -> ClientError {
    ClientError::Validation(format!("unknown dialog {dialog_id}"))
}

fn is_valid_phone(phone: &str) -> bool {
    phone.strip_prefix('+').is_some_and(|digits| {
        (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
    })
}
