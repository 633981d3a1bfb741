//! Plain-text message formatting shared by the views and the REPL.

use termgram_client::{Dialog, Message};

/// Indent for continuation lines of multi-line bodies.
const CONTINUATION: &str = "    ";

/// Render one message as one or more lines:
/// `-> [YYYY-MM-DD HH:MM] sender: text` for outgoing, `<-` for incoming.
pub fn message_lines(message: &Message) -> Vec<String> {
    let arrow = if message.outgoing { "->" } else { "<-" };
    let stamp = message.timestamp.format("%Y-%m-%d %H:%M");

    let mut body = message.display_text().lines();
    let first = body.next().unwrap_or_default();
    let mut lines = vec![format!("{arrow} [{stamp}] {}: {first}", message.sender)];
    lines.extend(body.map(|line| format!("{CONTINUATION}{line}")));
    lines
}

/// Dialog entry for listings: name plus unread count when non-zero.
pub fn dialog_label(dialog: &Dialog) -> String {
    if dialog.unread > 0 {
        format!("{} ({})", dialog.name, dialog.unread)
    } else {
        dialog.name.clone()
    }
}
