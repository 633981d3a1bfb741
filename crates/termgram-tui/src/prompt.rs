//! Login prompter for a real terminal.
//!
//! Wraps [`LinePrompter`] and reads secrets with echo off: the terminal is
//! switched to raw mode and keys are collected from crossterm until Enter.
//! When stdin is not a terminal, secrets are read as plain lines.

use std::io::{IsTerminal, stdin, stdout};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use termgram_app::login::{LinePrompter, LoginError, Prompter};
use termgram_client::ClientError;
use tokio::io::{AsyncBufRead, AsyncWrite};

/// Outcome of one key while reading a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    /// Keep reading.
    Continue,
    /// Enter pressed; the secret is complete.
    Done,
    /// Ctrl+C or Ctrl+D; give up.
    Abort,
}

/// Apply `key` to the secret being typed.
pub fn apply_secret_key(secret: &mut String, key: KeyEvent) -> SecretKey {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c' | 'd') => SecretKey::Abort,
            KeyCode::Char('u') => {
                secret.clear();
                SecretKey::Continue
            },
            _ => SecretKey::Continue,
        };
    }

    match key.code {
        KeyCode::Enter => SecretKey::Done,
        KeyCode::Char(c) => {
            secret.push(c);
            SecretKey::Continue
        },
        KeyCode::Backspace => {
            secret.pop();
            SecretKey::Continue
        },
        _ => SecretKey::Continue,
    }
}

/// Restores cooked mode when dropped.
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// [`Prompter`] that hides secrets on an interactive terminal.
pub struct TerminalPrompter<R, W> {
    inner: LinePrompter<R, W>,
}

impl<R, W> TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a prompter reading lines from `reader` and writing to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self { inner: LinePrompter::new(reader, writer) }
    }

    /// Give back the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        self.inner.into_parts()
    }
}

impl<R, W> Prompter for TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn prompt(&mut self, label: &str) -> Result<String, LoginError> {
        self.inner.prompt(label).await
    }

    async fn prompt_secret(&mut self, label: &str) -> Result<String, LoginError> {
        if !stdin().is_terminal() {
            return self.inner.prompt(label).await;
        }

        stdout().execute(Print(label))?;
        let secret = read_hidden().await;
        stdout().execute(Print("\r\n"))?;
        secret
    }

    async fn confirm_retry(&mut self, error: &ClientError) -> Result<bool, LoginError> {
        self.inner.confirm_retry(error).await
    }

    async fn notify(&mut self, message: &str) -> Result<(), LoginError> {
        self.inner.notify(message).await
    }
}

async fn read_hidden() -> Result<String, LoginError> {
    let _raw = RawMode::enable()?;
    let mut events = EventStream::new();
    let mut secret = String::new();

    while let Some(event) = events.next().await {
        let Event::Key(key) = event? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match apply_secret_key(&mut secret, key) {
            SecretKey::Continue => {},
            SecretKey::Done => return Ok(secret),
            SecretKey::Abort => return Err(LoginError::InputClosed),
        }
    }
    Err(LoginError::InputClosed)
}
