//! Interactive login handshake.
//!
//! [`run`] walks an [`Authenticator`] through phone, code and password,
//! asking the user for each value through a [`Prompter`]. Rejected input is
//! re-prompted a bounded number of times; transport failures are only
//! retried when the user confirms.

use std::{future::Future, io};

use termgram_client::{AuthStep, Authenticator, ClientError};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

/// Attempts per step before a rejected value ends the login.
pub const MAX_AUTH_ATTEMPTS: usize = 3;

/// Login failures.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The backend rejected the login or could not be reached.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Input ended before login completed.
    #[error("login aborted: input closed")]
    InputClosed,

    /// Reading or writing the prompt failed.
    #[error("prompt I/O error: {0}")]
    Io(#[from] io::Error),
}

/// User interaction needed by the login flow.
pub trait Prompter: Send {
    /// Show `label` and read one line, without the trailing newline.
    fn prompt(&mut self, label: &str) -> impl Future<Output = Result<String, LoginError>> + Send;

    /// Like [`Prompter::prompt`] but without echoing input where supported.
    fn prompt_secret(
        &mut self,
        label: &str,
    ) -> impl Future<Output = Result<String, LoginError>> + Send {
        self.prompt(label)
    }

    /// Ask whether to retry after a transport failure.
    fn confirm_retry(
        &mut self,
        error: &ClientError,
    ) -> impl Future<Output = Result<bool, LoginError>> + Send;

    /// Show an informational line.
    fn notify(&mut self, message: &str) -> impl Future<Output = Result<(), LoginError>> + Send;
}

/// [`Prompter`] over a buffered line reader and a writer.
///
/// Secrets are read like any other line, so a terminal echoes them. Wrap it
/// in a prompter that turns echo off when reading from a tty.
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> LinePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a prompter reading from `reader` and writing to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give back the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn read_line(&mut self) -> Result<String, LoginError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(LoginError::InputClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R, W> Prompter for LinePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn prompt(&mut self, label: &str) -> Result<String, LoginError> {
        self.writer.write_all(label.as_bytes()).await?;
        self.writer.flush().await?;
        self.read_line().await
    }

    async fn confirm_retry(&mut self, error: &ClientError) -> Result<bool, LoginError> {
        let answer = self.prompt(&format!("{error}. Retry? [y/N] ")).await?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
    }

    async fn notify(&mut self, message: &str) -> Result<(), LoginError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Log in unless a persisted session is already authorized.
///
/// # Errors
///
/// - [`LoginError::Client`] after [`MAX_AUTH_ATTEMPTS`] rejected values for
///   one step, or a transport failure the user chose not to retry.
/// - [`LoginError::InputClosed`] if input ends first.
pub async fn run<A, P>(auth: &A, prompter: &mut P) -> Result<(), LoginError>
where
    A: Authenticator,
    P: Prompter,
{
    if retrying(prompter, || auth.is_authorized()).await? {
        info!("session already authorized");
        return Ok(());
    }

    prompter.notify("Login required.").await?;

    let mut step = submit_step(prompter, "Phone number (international format): ", false, |phone| {
        async move { auth.login(&phone).await }
    })
    .await?;

    if step == AuthStep::CodeRequired {
        step = submit_step(prompter, "Login code: ", false, |code| async move {
            auth.submit_code(&code).await
        })
        .await?;
    }

    if step == AuthStep::PasswordRequired {
        submit_step(prompter, "Password: ", true, |password| async move {
            auth.submit_password(&password).await
        })
        .await?;
    }

    info!("login complete");
    prompter.notify("Logged in.").await
}

/// Read a value and submit it, re-prompting on rejection and offering a
/// retry on transport failure.
async fn submit_step<P, T, F, Fut>(
    prompter: &mut P,
    label: &str,
    secret: bool,
    mut submit: F,
) -> Result<T, LoginError>
where
    P: Prompter,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut rejected = 0;
    let mut input = read(prompter, label, secret).await?;

    loop {
        match submit(input.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                warn!(error = %err, "login step failed");
                if !prompter.confirm_retry(&err).await? {
                    return Err(err.into());
                }
            },
            Err(err) => {
                rejected += 1;
                warn!(error = %err, attempt = rejected, "login step rejected");
                if rejected >= MAX_AUTH_ATTEMPTS {
                    return Err(err.into());
                }
                prompter.notify(&format!("{err}. Try again.")).await?;
                input = read(prompter, label, secret).await?;
            },
        }
    }
}

/// Run a call that takes no input, offering a retry on transport failure.
async fn retrying<P, T, F, Fut>(prompter: &mut P, mut call: F) -> Result<T, LoginError>
where
    P: Prompter,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_transient() || !prompter.confirm_retry(&err).await? {
            return Err(err.into());
        }
    }
}

async fn read<P: Prompter>(prompter: &mut P, label: &str, secret: bool) -> Result<String, LoginError> {
    if secret {
        return prompter.prompt_secret(label).await;
    }
    Ok(prompter.prompt(label).await?.trim().to_string())
}
