//! In-memory executor for tests
//!
//! `FakeExecutor` records every session operation in order and answers
//! commands from a list of failure rules: a command fails when it contains
//! every needle of a rule, and succeeds otherwise. Clones share state, so a
//! test keeps one handle while the code under test drives another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{RemoteError, Result};
use crate::session::{CommandResult, Payload, RemoteExecutor, RemoteTarget, Session};

/// One recorded session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Run { command: String, privileged: bool },
    Put { source: Payload, destination: String },
}

#[derive(Debug, Clone)]
struct FailureRule {
    needles: Vec<String>,
    exit_code: i32,
    stderr: String,
}

impl FailureRule {
    fn matches(&self, command: &str) -> bool {
        self.needles.iter().all(|n| command.contains(n.as_str()))
    }
}

#[derive(Debug, Default)]
struct FakeState {
    unreachable: bool,
    sudo_denied: bool,
    refuse_connect: bool,
    rules: Vec<FailureRule>,
    failing_puts: Vec<String>,
    broken_on: Vec<String>,
    calls: Vec<FakeCall>,
    probes: usize,
    connects: usize,
    closes: usize,
}

/// Recording test double for [`RemoteExecutor`].
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    state: Arc<Mutex<FakeState>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `check_connection` report the host as unreachable.
    pub fn set_unreachable(&self) {
        self.state().unreachable = true;
    }

    /// Make `check_sudo` report that privileges cannot be escalated.
    pub fn deny_sudo(&self) {
        self.state().sudo_denied = true;
    }

    /// Make `connect` itself fail.
    pub fn refuse_connect(&self) {
        self.state().refuse_connect = true;
    }

    /// Commands containing `needle` exit with `exit_code`.
    pub fn fail_when(&self, needle: &str, exit_code: i32, stderr: &str) {
        self.fail_when_all(&[needle], exit_code, stderr);
    }

    /// Commands containing every one of `needles` exit with `exit_code`.
    pub fn fail_when_all(&self, needles: &[&str], exit_code: i32, stderr: &str) {
        self.state().rules.push(FailureRule {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            exit_code,
            stderr: stderr.to_string(),
        });
    }

    /// Commands containing `needle` cannot be run at all: `execute`
    /// returns an error instead of a result.
    pub fn break_when(&self, needle: &str) {
        self.state().broken_on.push(needle.to_string());
    }

    /// Transfers to `destination` fail.
    pub fn fail_put(&self, destination: &str) {
        self.state().failing_puts.push(destination.to_string());
    }

    /// Every recorded operation, in order.
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state().calls.clone()
    }

    /// Command lines of every `run` and `sudo`, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                FakeCall::Run { command, .. } => Some(command.clone()),
                FakeCall::Put { .. } => None,
            })
            .collect()
    }

    /// Destinations of every `put`, in order.
    pub fn uploads(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                FakeCall::Put { destination, .. } => Some(destination.clone()),
                FakeCall::Run { .. } => None,
            })
            .collect()
    }

    pub fn probes(&self) -> usize {
        self.state().probes
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }
}

#[async_trait]
impl RemoteExecutor for FakeExecutor {
    async fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn Session>> {
        let mut state = self.state();
        if state.refuse_connect || state.unreachable {
            return Err(RemoteError::ConnectFailed {
                target: target.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        state.connects += 1;
        Ok(Box::new(FakeSession {
            target: target.clone(),
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }

    async fn check_connection(&self, _target: &RemoteTarget) -> bool {
        let mut state = self.state();
        state.probes += 1;
        !state.unreachable
    }

    async fn check_sudo(&self, _target: &RemoteTarget) -> bool {
        let mut state = self.state();
        state.probes += 1;
        !state.unreachable && !state.sudo_denied
    }
}

struct FakeSession {
    target: RemoteTarget,
    state: Arc<Mutex<FakeState>>,
    closed: bool,
}

impl FakeSession {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(RemoteError::SessionClosed(self.target.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for FakeSession {
    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    async fn execute(&mut self, command: &str, privileged: bool) -> Result<CommandResult> {
        self.ensure_open()?;
        let mut state = self.state();
        state.calls.push(FakeCall::Run {
            command: command.to_string(),
            privileged,
        });

        if state.broken_on.iter().any(|n| command.contains(n.as_str())) {
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        let result = match state.rules.iter().find(|r| r.matches(command)) {
            Some(rule) => CommandResult::failure(rule.exit_code, rule.stderr.clone()),
            None => CommandResult::success(""),
        };
        Ok(result)
    }

    async fn put(&mut self, source: &Payload, destination: &str) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.state();
        state.calls.push(FakeCall::Put {
            source: source.clone(),
            destination: destination.to_string(),
        });

        if state.failing_puts.iter().any(|d| d == destination) {
            return Err(RemoteError::TransferFailed {
                target: self.target.to_string(),
                destination: destination.to_string(),
                reason: "simulated transfer failure".to_string(),
            });
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.state().closes += 1;
        }
        Ok(())
    }
}
