//! Key bindings of the interactive mode.

use crate::Focus;

/// `(keys, description)` for every binding, in help order.
pub const KEY_BINDINGS: &[(&str, &str)] = &[
    ("Up/Down", "select dialog"),
    ("Right", "open dialog"),
    ("Up/Down, PgUp/PgDn", "scroll messages (in viewer)"),
    ("Home/End", "oldest/newest loaded message (in viewer)"),
    ("Enter/Tab", "compose message"),
    ("Enter", "send (in compose box)"),
    ("Esc", "back one pane"),
    ("Left", "back to dialog list (in viewer)"),
    ("Ctrl+Y", "load older messages"),
    ("Ctrl+R", "reload dialogs"),
    ("?", "show or hide this help"),
    ("Ctrl+C/Ctrl+Q", "quit"),
];

/// Short hint line for the focused pane.
pub fn hints(focus: Focus) -> &'static str {
    match focus {
        Focus::DialogList => "↑/↓ select  → open  Enter compose  ^R reload  ? help  ^Q quit",
        Focus::MessageViewer => "↑/↓ scroll  ^Y older  Enter compose  Esc back  ? help  ^Q quit",
        Focus::ComposeBox => "Enter send  Esc back  ^Q quit",
    }
}
