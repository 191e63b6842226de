//! Remote execution error types

use thiserror::Error;

/// Errors raised by a remote executor or one of its sessions.
///
/// Every variant is fatal for the workflow that owns the session. Expected
/// failures (a probe for a resource that does not exist yet) never become
/// a `RemoteError`: they are reported through `CommandResult::succeeded`.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Cannot connect to {target}: {reason}")]
    ConnectFailed { target: String, reason: String },

    #[error("Command failed on {target} (exit code {code}): {command}\n{stderr}")]
    CommandFailed {
        target: String,
        command: String,
        code: String,
        stderr: String,
    },

    #[error("Transfer to {target}:{destination} failed: {reason}")]
    TransferFailed {
        target: String,
        destination: String,
        reason: String,
    },

    #[error("Session to {0} is already closed")]
    SessionClosed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;
