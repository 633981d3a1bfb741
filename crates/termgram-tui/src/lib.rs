//! Terminal UI for termgram
//!
//! A thin shell over [`termgram_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`termgram_app::Runtime`].
//!
//! This crate handles command-line configuration, logging setup, the login prompt
//! and terminal rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod logging;
pub mod prompt;
pub mod terminal;
pub mod ui;

pub use config::{Args, Config, ConfigError, Mode};
pub use prompt::TerminalPrompter;
pub use termgram_app::{App, AppAction, AppEvent, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
