//! Error types for session lifecycle operations

use thiserror::Error;

use crate::controller::SessionState;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that keep a session from starting or running.
///
/// Camera and fullscreen failures are fatal preconditions: the session stays
/// in [`SessionState::NotStarted`] and the caller decides whether to ask the
/// user again. Transient collaborator failures (classification, quiz fetch)
/// never surface here.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Fullscreen request rejected: {0}")]
    FullscreenRejected(String),

    #[error("Session already started (state: {0})")]
    AlreadyStarted(SessionState),

    #[error("Session is not running (state: {0})")]
    NotRunning(SessionState),

    #[error("All monitors stopped before the session ended")]
    MonitorsStopped,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Whether this error is a fatal precondition failure at start
    #[must_use]
    pub const fn is_precondition_failure(&self) -> bool {
        matches!(self, Self::CameraUnavailable(_) | Self::FullscreenRejected(_))
    }
}
