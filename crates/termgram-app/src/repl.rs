//! Line-oriented front end.
//!
//! Reads one line at a time: lines starting with `:` are commands, anything
//! else is sent to the selected dialog. Every command answers with one block
//! of output. Useful where a full-screen terminal is unavailable, such as
//! pipes and scripts.

use std::{io, sync::Arc};

use termgram_client::{ClientError, ConversationService, Dialog, HISTORY_PAGE_SIZE};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::format;

/// Prompt shown before each line.
pub const PROMPT: &str = "msg (:help for commands)> ";

const HELP: &str = "Commands:
  :<number>        Switch to dialog by index
  :open <number>   Same as :<number>
  :dialogs         Show dialog list
  :more            Load more history
  :reload          Reload dialogs
  :help            Show this help
  :quit            Exit the client";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `:q`, `:quit`, `:exit`
    Quit,
    /// `:h`, `:help`
    Help,
    /// `:d`, `:dialogs`
    Dialogs,
    /// `:r`, `:reload`
    Reload,
    /// `:m`, `:more`
    More,
    /// `:<n>` or `:open <n>`
    Open(usize),
    /// Unrecognized command, with the text after the colon.
    Unknown(String),
    /// Plain text to send.
    Send(String),
}

impl ReplCommand {
    /// Parse a line. Blank lines and a bare `:` yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Some(Self::Send(line.to_string()));
        };

        let normalized = command.trim();
        let parsed = match normalized {
            "" => return None,
            "q" | "quit" | "exit" => Self::Quit,
            "h" | "help" => Self::Help,
            "d" | "dialogs" => Self::Dialogs,
            "r" | "reload" => Self::Reload,
            "m" | "more" => Self::More,
            _ => parse_index(normalized)
                .or_else(|| {
                    let mut parts = normalized.split_whitespace();
                    match (parts.next(), parts.next(), parts.next()) {
                        (Some("open"), Some(index), None) => parse_index(index),
                        _ => None,
                    }
                })
                .map_or_else(|| Self::Unknown(command.to_string()), Self::Open),
        };
        Some(parsed)
    }
}

fn parse_index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Line REPL over a conversation service.
pub struct Repl<S, R, W> {
    service: Arc<S>,
    reader: R,
    writer: W,
    dialogs: Vec<Dialog>,
    current: Option<usize>,
    limit: usize,
}

impl<S, R, W> Repl<S, R, W>
where
    S: ConversationService,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a REPL printing `limit` messages per dialog.
    pub fn new(service: Arc<S>, reader: R, writer: W, limit: usize) -> Self {
        Self { service, reader, writer, dialogs: Vec::new(), current: None, limit: limit.max(1) }
    }

    /// Give back the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Run until `:quit` or end of input, then disconnect the service.
    ///
    /// Service failures are printed and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    pub async fn run(&mut self) -> io::Result<()> {
        self.reload().await?;
        if self.dialogs.is_empty() {
            self.line("No dialogs found. Start a conversation from another client.").await?;
        } else {
            self.open(0).await?;
        }
        self.line("Type messages to send them. Commands start with ':'. Type :help for guidance.")
            .await?;

        let mut input = String::new();
        loop {
            self.writer.write_all(PROMPT.as_bytes()).await?;
            self.writer.flush().await?;

            input.clear();
            if self.reader.read_line(&mut input).await? == 0 {
                debug!("input closed");
                break;
            }

            let Some(command) = ReplCommand::parse(&input) else {
                continue;
            };
            if !self.execute(command).await? {
                break;
            }
        }

        self.service.disconnect().await;
        self.line("Disconnected.").await
    }

    /// Returns `false` when the REPL should stop.
    async fn execute(&mut self, command: ReplCommand) -> io::Result<bool> {
        match command {
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Help => self.line(HELP).await?,
            ReplCommand::Dialogs => self.list().await?,
            ReplCommand::Reload => self.reload().await?,
            ReplCommand::More => {
                self.limit = self.limit.saturating_add(HISTORY_PAGE_SIZE);
                match self.current_dialog().cloned() {
                    Some(dialog) => self.show_messages(&dialog).await?,
                    None => self.line("No active dialog to load more messages from.").await?,
                }
            },
            ReplCommand::Open(index) => self.open(index).await?,
            ReplCommand::Unknown(command) => {
                self.line(&format!("Unknown command: :{command}")).await?;
            },
            ReplCommand::Send(text) => self.send(text).await?,
        }
        Ok(true)
    }

    async fn reload(&mut self) -> io::Result<()> {
        let selected = self.current_dialog().map(|d| d.id);
        match self.service.list_dialogs().await {
            Ok(dialogs) => {
                self.dialogs = dialogs;
                self.current = selected
                    .and_then(|id| self.dialogs.iter().position(|d| d.id == id))
                    .or(if self.dialogs.is_empty() { None } else { Some(0) });
            },
            Err(err) => return self.report(&err).await,
        }
        self.list().await
    }

    async fn list(&mut self) -> io::Result<()> {
        if self.dialogs.is_empty() {
            return self.line("No dialogs available.").await;
        }

        let mut block = String::from("Dialogs:");
        for (index, dialog) in self.dialogs.iter().enumerate() {
            let marker = if Some(index) == self.current { '*' } else { ' ' };
            block.push_str(&format!("\n {marker} {index}: {}", format::dialog_label(dialog)));
        }
        self.line(&block).await
    }

    async fn open(&mut self, index: usize) -> io::Result<()> {
        let Some(dialog) = self.dialogs.get(index).cloned() else {
            return self.line(&format!("Invalid dialog index: {index}")).await;
        };
        self.current = Some(index);
        self.line(&format!("--- {} ---", dialog.name)).await?;
        self.show_messages(&dialog).await
    }

    async fn send(&mut self, text: String) -> io::Result<()> {
        let Some(dialog) = self.current_dialog().cloned() else {
            return self.line("Choose a dialog before sending messages (:dialogs).").await;
        };

        match self.service.send_message(dialog.id, text).await {
            Ok(message) => debug!(id = message.id, "sent"),
            Err(err) => return self.report(&err).await,
        }
        self.show_messages(&dialog).await
    }

    async fn show_messages(&mut self, dialog: &Dialog) -> io::Result<()> {
        let messages = match self.service.fetch_history(dialog.id, None, self.limit).await {
            Ok(messages) => messages,
            Err(err) => return self.report(&err).await,
        };
        if messages.is_empty() {
            return self.line("No messages yet.").await;
        }

        let lines: Vec<String> = messages.iter().flat_map(format::message_lines).collect();
        self.line(&lines.join("\n")).await
    }

    fn current_dialog(&self) -> Option<&Dialog> {
        self.current.and_then(|i| self.dialogs.get(i))
    }

    async fn report(&mut self, err: &ClientError) -> io::Result<()> {
        warn!(error = %err, "service call failed");
        self.line(&format!("Error: {err}")).await
    }

    async fn line(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        for (line, expected) in [
            (":q", ReplCommand::Quit),
            (":exit", ReplCommand::Quit),
            (":help", ReplCommand::Help),
            (":d", ReplCommand::Dialogs),
            (":reload", ReplCommand::Reload),
            (":m", ReplCommand::More),
            (":3", ReplCommand::Open(3)),
            (":open 12", ReplCommand::Open(12)),
            ("  hello there ", ReplCommand::Send("hello there".into())),
        ] {
            assert_eq!(ReplCommand::parse(line), Some(expected), "line {line:?}");
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(ReplCommand::parse(""), None);
        assert_eq!(ReplCommand::parse("   \n"), None);
        assert_eq!(ReplCommand::parse(":"), None);
    }

    #[test]
    fn malformed_commands_are_unknown() {
        assert_eq!(ReplCommand::parse(":open"), Some(ReplCommand::Unknown("open".into())));
        assert_eq!(ReplCommand::parse(":open x"), Some(ReplCommand::Unknown("open x".into())));
        assert_eq!(ReplCommand::parse(":-1"), Some(ReplCommand::Unknown("-1".into())));
        assert_eq!(ReplCommand::parse(":frobnicate"), Some(ReplCommand::Unknown("frobnicate".into())));
    }
}
