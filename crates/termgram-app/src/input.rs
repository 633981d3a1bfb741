//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic testing of key handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Character pressed with Control held. Always lowercase.
    Ctrl(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Tab key (focus compose box).
    Tab,
    /// Escape key (one pane back toward the dialog list).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Page Up key (scroll messages a screen back).
    PageUp,
    /// Page Down key (scroll messages a screen forward).
    PageDown,
    /// Home key (cursor to start, or oldest loaded message).
    Home,
    /// End key (cursor to end, or newest message).
    End,
}
