//! Driver trait for abstracting terminal I/O.
//!
//! The [`Driver`] trait decouples the application runtime from specific
//! terminal implementations. Each frontend implements the trait to provide
//! input events and rendering, while the generic [`crate::Runtime`] handles
//! all orchestration with the conversation service.

use std::future::Future;

use crate::{App, AppEvent};

/// Abstracts terminal I/O for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the real terminal and in tests.
///
/// # Implementations
///
/// - **TUI**: crossterm for key events, ratatui for rendering
/// - **Tests**: scripted key sequences, render counting
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next input event.
    ///
    /// Resolves with an event, or `None` when the poll interval elapsed with
    /// nothing to report. Must be cancel safe: the runtime races it against
    /// service completions.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Release terminal resources.
    fn stop(&mut self);
}
