//! Error taxonomy of the windowing layer.
//!
//! A lost display connection is not represented here: the native transport
//! gives no way to resume a severed session, so the installed IO error hook
//! logs the failure and aborts the process.

use thiserror::Error;

/// Errors surfaced by window and context construction and by individual
/// display-server requests.
#[derive(Debug, Error)]
pub enum Error {
    /// The native display connection could not be established. Fatal at
    /// construction time; never retried automatically.
    #[error("failed to connect to the display server: {0}")]
    Connection(String),

    /// A single native request was rejected by the display server. The
    /// connection itself stays usable.
    #[error("display server rejected a request: {0}")]
    Protocol(String),

    /// The native window could not be created.
    #[error("failed to create native window: {0}")]
    WindowCreation(String),

    /// No graphics context satisfying the requested [`ContextSettings`]
    /// could be created. Callers wanting a fallback must retry with
    /// reduced settings themselves.
    ///
    /// [`ContextSettings`]: crate::ContextSettings
    #[error("failed to create graphics context: {0}")]
    ContextCreation(String),
}
