//! Remote executor and session traits

use crate::error::{RemoteError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identity of a remote host: who to log in as, where, and on which port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteTarget {
    pub username: String,
    pub host: String,
    pub port: u16,
}

impl RemoteTarget {
    pub fn new(username: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            username: username.into(),
            host: host.into(),
            port,
        }
    }

    /// `user@host`, as understood by ssh and scp
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

/// Outcome of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command exited with status zero
    pub succeeded: bool,

    /// Exit status, if the command ran to completion
    pub exit_code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl CommandResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn exit_code_label(&self) -> String {
        self.exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string())
    }
}

/// Content transferred to the remote host by [`Session::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A file on the local filesystem
    File(PathBuf),
    /// An in-memory buffer (rendered configuration, embedded scripts)
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Payload::File(path.into())
    }

    pub fn bytes(content: impl Into<Vec<u8>>) -> Self {
        Payload::Bytes(content.into())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::File(path) => write!(f, "{}", path.display()),
            Payload::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Opens sessions and answers reachability probes.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Open an authenticated session. The caller must `close` it.
    async fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn Session>>;

    /// Read-only probe: can we authenticate against the target?
    async fn check_connection(&self, target: &RemoteTarget) -> bool;

    /// Read-only probe: can the user escalate privileges without a prompt?
    async fn check_sudo(&self, target: &RemoteTarget) -> bool;
}

/// A live, authenticated handle to a single host.
///
/// Implementors provide [`execute`](Session::execute), [`put`](Session::put)
/// and [`close`](Session::close); the pass/fail policy of `run` and `sudo`
/// is shared by every implementation.
#[async_trait]
pub trait Session: Send {
    fn target(&self) -> &RemoteTarget;

    /// Run a command and report its outcome without judging it.
    ///
    /// Returns `Err` only when the command could not be run at all.
    async fn execute(&mut self, command: &str, privileged: bool) -> Result<CommandResult>;

    /// Transfer `source` to `destination` (relative to the login directory
    /// unless absolute).
    async fn put(&mut self, source: &Payload, destination: &str) -> Result<()>;

    /// Release the session. Idempotent.
    async fn close(&mut self) -> Result<()>;

    /// Run a command as the authenticated user.
    ///
    /// A non-zero exit is fatal unless `ignore_failures` is set, in which
    /// case it is reported through [`CommandResult::succeeded`].
    async fn run(&mut self, command: &str, ignore_failures: bool) -> Result<CommandResult> {
        let result = self.execute(command, false).await?;
        if !result.succeeded && !ignore_failures {
            return Err(command_failed(self.target(), command, &result));
        }
        Ok(result)
    }

    /// Run a command with escalated privileges. A non-zero exit is always fatal.
    async fn sudo(&mut self, command: &str) -> Result<CommandResult> {
        let result = self.execute(command, true).await?;
        if !result.succeeded {
            return Err(command_failed(self.target(), command, &result));
        }
        Ok(result)
    }
}

fn command_failed(target: &RemoteTarget, command: &str, result: &CommandResult) -> RemoteError {
    RemoteError::CommandFailed {
        target: target.to_string(),
        command: command.to_string(),
        code: result.exit_code_label(),
        stderr: result.stderr.trim().to_string(),
    }
}
