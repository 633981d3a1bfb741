//! Client contracts for termgram
//!
//! Everything the terminal frontends know about the messaging protocol goes
//! through this crate. The protocol client itself is an external collaborator:
//! frontends see only the value types ([`Dialog`], [`Message`]) and the two
//! async contracts it must satisfy.
//!
//! # Components
//!
//! - [`ConversationService`]: list dialogs, page through history, send, and
//!   subscribe to incoming messages
//! - [`Authenticator`]: phone / code / password login handshake
//! - [`SessionStore`]: persisted session token at a configured path
//! - [`SimBackend`]: in-process simulated backend implementing both traits

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod auth;
mod error;
mod model;
mod service;
pub mod sim;

pub use auth::{AuthStep, Authenticator, SessionStore};
pub use error::{AuthFailure, ClientError};
pub use model::{Dialog, DialogId, Message, MessageId};
pub use service::{ConversationService, HISTORY_PAGE_SIZE, Subscription, validate_text};
pub use sim::{SIM_LOGIN_CODE, SimBackend, SimConfig, SimStats};
