//! Command-line arguments and validated configuration.
//!
//! Every flag falls back to an environment variable, so the client can be
//! configured entirely from the environment. [`Config::from_args`] rejects
//! missing or malformed credentials before anything connects.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use termgram_client::HISTORY_PAGE_SIZE;
use thiserror::Error;

/// Largest accepted `--limit`.
pub const MAX_LIMIT: usize = 1000;

/// Length of an API hash in hex digits.
const API_HASH_LEN: usize = 32;

/// Front end to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Full-screen terminal UI.
    Interactive,
    /// Line-oriented prompt with colon commands.
    Legacy,
}

/// Terminal client for Telegram-style messaging
#[derive(Parser, Debug)]
#[command(name = "termgram")]
#[command(about = "Terminal client for Telegram-style messaging")]
#[command(version)]
pub struct Args {
    /// Front end to run
    #[arg(long, value_enum, env = "TERMINAL_TELEGRAM_MODE", default_value_t = Mode::Interactive)]
    pub mode: Mode,

    /// Application id issued for the API
    #[arg(long, env = "TELEGRAM_API_ID")]
    pub api_id: Option<String>,

    /// Application hash issued for the API
    #[arg(long, env = "TELEGRAM_API_HASH", hide_env_values = true)]
    pub api_hash: Option<String>,

    /// Path of the persisted session token
    #[arg(long, env = "TELEGRAM_SESSION", default_value = "terminal_session")]
    pub session: PathBuf,

    /// Messages loaded when a dialog is opened
    #[arg(long, default_value_t = HISTORY_PAGE_SIZE)]
    pub limit: usize,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file
    ///
    /// Interactive mode discards logs unless a file is given, so they never
    /// garble the screen.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API id given.
    #[error("missing API id: set TELEGRAM_API_ID or pass --api-id")]
    MissingApiId,

    /// API id is not a positive integer.
    #[error("invalid API id {0:?}: expected a positive integer")]
    InvalidApiId(String),

    /// No API hash given.
    #[error("missing API hash: set TELEGRAM_API_HASH or pass --api-hash")]
    MissingApiHash,

    /// API hash is not 32 hex digits.
    #[error("invalid API hash: expected 32 hexadecimal characters")]
    InvalidApiHash,

    /// Page size out of range.
    #[error("invalid --limit {0}: expected 1 to {MAX_LIMIT}")]
    InvalidLimit(usize),
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Front end to run.
    pub mode: Mode,
    /// Application id.
    pub api_id: i32,
    /// Application hash, lowercase hex.
    pub api_hash: String,
    /// Session token path.
    pub session: PathBuf,
    /// Messages loaded when a dialog is opened.
    pub limit: usize,
    /// Default log level.
    pub log_level: String,
    /// Log file, if any.
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Validate parsed arguments.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let api_id = args.api_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let api_id = api_id.ok_or(ConfigError::MissingApiId)?;
        let api_id = match api_id.parse::<i32>() {
            Ok(id) if id > 0 => id,
            _ => return Err(ConfigError::InvalidApiId(api_id.to_string())),
        };

        let api_hash = args.api_hash.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let api_hash = api_hash.ok_or(ConfigError::MissingApiHash)?;
        if api_hash.len() != API_HASH_LEN || !api_hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidApiHash);
        }

        if !(1..=MAX_LIMIT).contains(&args.limit) {
            return Err(ConfigError::InvalidLimit(args.limit));
        }

        Ok(Self {
            mode: args.mode,
            api_id,
            api_hash: api_hash.to_ascii_lowercase(),
            session: args.session,
            limit: args.limit,
            log_level: args.log_level,
            log_file: args.log_file,
        })
    }
}
