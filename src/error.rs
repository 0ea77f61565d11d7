//! Error taxonomy for the wait pipeline.
//!
//! Every failure here is fatal to the process, but the decision to exit is
//! made only in `main`: components return these values and stay testable.
//! The exit code follows the failure class: 1 for usage and logical
//! protocol errors, 2 when an OS-level call failed underneath.

use std::io;

use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

/// Exit code for usage and logical errors.
pub const EXIT_LOGIC: i32 = 1;
/// Exit code for failed OS-level calls.
pub const EXIT_OS: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),

    /// The peer sent something that is not the expected i3-ipc shape.
    #[error("protocol mismatch: {0}")]
    Protocol(String),

    /// Event payload is not parseable JSON.
    #[error("malformed event payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// `container.window` is absent or not an integer.
    #[error("window id not found in event payload")]
    WindowIdMissing,

    /// Socket I/O failed.
    #[error("ipc transport: {0}")]
    Transport(#[source] io::Error),

    /// Could not spawn the target command.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// `i3 --get-socketpath` failed or printed nothing.
    #[error("could not determine i3 socket path: {0}")]
    SocketPath(String),

    /// Could not connect to the X server.
    #[error("failed to connect to X server: {0}")]
    X11Connect(#[source] ConnectError),

    /// The X connection died mid-operation.
    #[error("X connection failed: {0}")]
    X11(#[source] ConnectionError),

    /// The X server refused or could not answer a request, e.g. the window
    /// id from the event is no longer valid.
    #[error("X request failed: {0}")]
    X11Reply(String),

    /// The configured focus-check bound ran out.
    #[error("window 0x{window:x} never took focus after {checks} checks")]
    FocusTimeout { window: u32, checks: u64 },
}

impl Error {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_)
            | Error::Protocol(_)
            | Error::MalformedPayload(_)
            | Error::WindowIdMissing
            | Error::X11Reply(_)
            | Error::FocusTimeout { .. } => EXIT_LOGIC,
            Error::Transport(_)
            | Error::Spawn { .. }
            | Error::SocketPath(_)
            | Error::X11Connect(_)
            | Error::X11(_) => EXIT_OS,
        }
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::X11(err)
    }
}

impl From<ReplyError> for Error {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::ConnectionError(err) => Error::X11(err),
            other => Error::X11Reply(other.to_string()),
        }
    }
}

impl From<ReplyOrIdError> for Error {
    fn from(err: ReplyOrIdError) -> Self {
        match err {
            ReplyOrIdError::ConnectionError(err) => Error::X11(err),
            other => Error::X11Reply(other.to_string()),
        }
    }
}
