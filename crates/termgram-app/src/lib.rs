//! Application layer for termgram
//!
//! Pure state machine and generic runtime for the terminal messaging client,
//! plus the two line-oriented front ends that share the same service: the
//! login handshake and the legacy REPL.
//!
//! # Components
//!
//! - [`App`]: UI state machine (focus, selection, conversation window,
//!   compose buffer, loading flags)
//! - [`Driver`]: Trait for platform-specific terminal I/O
//! - [`Runtime`]: Orchestration loop running service calls for the App
//! - [`login`]: Phone / code / password handshake over a [`login::Prompter`]
//! - [`repl`]: Colon-command front end for scripting contexts

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod driver;
mod event;
pub mod format;
mod input;
pub mod keymap;
pub mod login;
pub mod repl;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::KeyInput;
pub use runtime::Runtime;
pub use state::{ComposeBuffer, ConversationWindow, Focus};
