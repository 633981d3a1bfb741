//! Client error taxonomy.
//!
//! Every failure surfaced by a [`crate::ConversationService`] or
//! [`crate::Authenticator`] falls into one of three kinds:
//! - Transport failures ([`ClientError::Connection`])
//! - Rejected credentials ([`ClientError::Auth`])
//! - Input rejected before any transport work ([`ClientError::Validation`])

use thiserror::Error;

/// Errors returned by the protocol client.
///
/// Cloneable so failures can travel inside application events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Transport or network failure.
    ///
    /// Transient. Callers keep their previous state and may offer a retry.
    #[error("connection error: {0}")]
    Connection(String),

    /// Credentials, code or password were rejected.
    #[error("authentication failed: {0}")]
    Auth(AuthFailure),

    /// Input rejected locally (empty message, unknown dialog, bad selection).
    #[error("invalid input: {0}")]
    Validation(String),
}

impl ClientError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<AuthFailure> for ClientError {
    fn from(failure: AuthFailure) -> Self {
        Self::Auth(failure)
    }
}

/// Reason an authentication step was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// Phone number is not in international format.
    #[error("invalid phone number")]
    InvalidPhone,

    /// Confirmation code did not match.
    #[error("invalid confirmation code")]
    InvalidCode,

    /// Two-factor password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Operation requires a logged-in session.
    #[error("not authorized")]
    Unauthorized,

    /// Step submitted out of order (e.g. code before phone).
    #[error("unexpected login step")]
    UnexpectedStep,
}
