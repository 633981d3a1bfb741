//! Login handshake contract and session persistence.
//!
//! Logging in is a short sequence of steps driven by the caller: submit the
//! phone number, then the confirmation code, then the two-factor password if
//! the account has one. Each step returns the next [`AuthStep`].
//!
//! On success the backend persists a reusable session token so the next start
//! skips the handshake. Token storage goes through [`SessionStore`].

use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
};

use crate::ClientError;

/// Next step of the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// A confirmation code was sent; submit it with
    /// [`Authenticator::submit_code`].
    CodeRequired,
    /// Two-factor password required; submit it with
    /// [`Authenticator::submit_password`].
    PasswordRequired,
    /// Session is logged in.
    Authenticated,
}

/// Login handshake against the protocol client.
///
/// Implementations never retry on their own: transport failures surface as
/// [`ClientError::Connection`] and the caller decides whether to try again.
pub trait Authenticator: Send + Sync {
    /// Whether a persisted session is already logged in.
    fn is_authorized(&self) -> impl Future<Output = Result<bool, ClientError>> + Send;

    /// Start login with a phone number in international format.
    fn login(&self, phone: &str) -> impl Future<Output = Result<AuthStep, ClientError>> + Send;

    /// Submit the confirmation code received for the phone number.
    fn submit_code(&self, code: &str)
    -> impl Future<Output = Result<AuthStep, ClientError>> + Send;

    /// Submit the two-factor password.
    ///
    /// # Errors
    ///
    /// [`ClientError::Auth`] with
    /// [`crate::AuthFailure::InvalidCredentials`] when the password is wrong.
    fn submit_password(&self, password: &str)
    -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Session token persisted at a configured path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token. `None` if no session has been saved.
    pub async fn load(&self) -> Result<Option<String>, ClientError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&self.path, &e)),
        }
    }

    /// Persist `token`, replacing any previous session.
    pub async fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(&self.path, &e))?;
        }

        tokio::fs::write(&self.path, format!("{token}\n"))
            .await
            .map_err(|e| storage_error(&self.path, &e))?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the stored session, if any.
    pub async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&self.path, &e)),
        }
    }
}

fn storage_error(path: &Path, err: &io::Error) -> ClientError {
    ClientError::Connection(format!("session file {}: {err}", path.display()))
}
