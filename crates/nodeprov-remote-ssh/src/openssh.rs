//! ssh / scp CLI wrapper
//!
//! Wraps the OpenSSH client binaries for nodeprov's remote operations.

use async_trait::async_trait;
use nodeprov_remote::{
    CommandResult, Payload, RemoteError, RemoteExecutor, RemoteTarget, Result, Session,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const CONTROL_SOCKET: &str = "ctl";

/// Connection options shared by every ssh / scp invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshOptions {
    /// Private key passed with `-i`
    pub identity_file: Option<PathBuf>,

    /// `ConnectTimeout` in seconds
    pub connect_timeout: u64,

    /// `StrictHostKeyChecking` value (`yes`, `no`, `accept-new`)
    pub strict_host_key_checking: Option<String>,

    pub ssh_program: String,

    pub scp_program: String,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            identity_file: None,
            connect_timeout: 10,
            strict_host_key_checking: None,
            ssh_program: "ssh".to_string(),
            scp_program: "scp".to_string(),
        }
    }
}

impl SshOptions {
    /// Options common to ssh and scp. `scp_style` selects `-P` over `-p`.
    fn common_args(&self, target: &RemoteTarget, control: Option<&Path>, scp_style: bool) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
        ];

        if let Some(ref policy) = self.strict_host_key_checking {
            args.push("-o".to_string());
            args.push(format!("StrictHostKeyChecking={policy}"));
        }

        if let Some(ref identity) = self.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }

        if let Some(control) = control {
            args.push("-o".to_string());
            args.push(format!("ControlPath={}", control.display()));
        }

        args.push(if scp_style { "-P" } else { "-p" }.to_string());
        args.push(target.port.to_string());
        args
    }

    /// Arguments for `ssh ... user@host <remote_command>`
    pub fn ssh_args(&self, target: &RemoteTarget, control: Option<&Path>, remote_command: &str) -> Vec<String> {
        let mut args = self.common_args(target, control, false);
        args.push(target.destination());
        args.push(remote_command.to_string());
        args
    }

    /// Arguments that start a background master connection on `control`
    pub fn master_args(&self, target: &RemoteTarget, control: &Path) -> Vec<String> {
        let mut args = self.common_args(target, Some(control), false);
        args.extend(
            ["-o", "ControlMaster=yes", "-o", "ControlPersist=yes", "-f", "-N"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(target.destination());
        args
    }

    /// Arguments that stop the master connection on `control`
    pub fn exit_args(&self, target: &RemoteTarget, control: &Path) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("ControlPath={}", control.display()),
            "-O".to_string(),
            "exit".to_string(),
            target.destination(),
        ]
    }

    /// Arguments for `scp ... <local> user@host:<destination>`
    pub fn scp_args(&self, target: &RemoteTarget, control: Option<&Path>, local: &Path, destination: &str) -> Vec<String> {
        let mut args = self.common_args(target, control, true);
        args.push("-q".to_string());
        args.push(local.display().to_string());
        args.push(format!("{}:{}", target.destination(), destination));
        args
    }
}

/// Quote `s` for a POSIX shell.
pub fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Wrap a command so it runs as root without prompting for a password.
fn privileged(command: &str) -> String {
    format!("sudo -n /bin/sh -c {}", sh_quote(command))
}

fn command_summary(out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    format!("status {}", out.status)
}

/// OpenSSH-backed executor
#[derive(Debug, Clone, Default)]
pub struct OpenSsh {
    options: SshOptions,
}

impl OpenSsh {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    /// Run a one-off ssh command and report whether it exited zero.
    async fn probe(&self, target: &RemoteTarget, remote_command: &str) -> bool {
        let args = self.options.ssh_args(target, None, remote_command);
        tracing::debug!(host = %target, command = remote_command, "Probing");

        let status = Command::new(&self.options.ssh_program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to spawn {}", self.options.ssh_program);
                false
            }
        }
    }
}

#[async_trait]
impl RemoteExecutor for OpenSsh {
    async fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn Session>> {
        let control_dir = tempfile::Builder::new().prefix("nodeprov-").tempdir()?;
        let control = control_dir.path().join(CONTROL_SOCKET);
        let args = self.options.master_args(target, &control);

        tracing::debug!(host = %target, "Opening master connection");

        // The forked master keeps inherited pipes open, so nothing is captured here.
        let status = Command::new(&self.options.ssh_program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(RemoteError::ConnectFailed {
                target: target.to_string(),
                reason: format!("ssh exited with {status}"),
            });
        }

        tracing::info!(host = %target, "Connected");
        Ok(Box::new(OpenSshSession {
            target: target.clone(),
            options: self.options.clone(),
            control_dir: Some(control_dir),
        }))
    }

    async fn check_connection(&self, target: &RemoteTarget) -> bool {
        self.probe(target, "true").await
    }

    async fn check_sudo(&self, target: &RemoteTarget) -> bool {
        self.probe(target, "sudo -n true").await
    }
}

/// Session multiplexed over one ssh master connection
pub struct OpenSshSession {
    target: RemoteTarget,
    options: SshOptions,
    control_dir: Option<TempDir>,
}

impl OpenSshSession {
    fn control_path(&self) -> Result<PathBuf> {
        self.control_dir
            .as_ref()
            .map(|dir| dir.path().join(CONTROL_SOCKET))
            .ok_or_else(|| RemoteError::SessionClosed(self.target.to_string()))
    }

    async fn put_file(&self, control: &Path, local: &Path, destination: &str) -> Result<Output> {
        let args = self.options.scp_args(&self.target, Some(control), local, destination);
        let output = Command::new(&self.options.scp_program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        Ok(output)
    }

    async fn put_bytes(&self, control: &Path, bytes: &[u8], destination: &str) -> Result<Output> {
        let remote_command = format!("cat > {}", sh_quote(destination));
        let args = self.options.ssh_args(&self.target, Some(control), &remote_command);

        let mut child = Command::new(&self.options.ssh_program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(bytes).await?;
            stdin.shutdown().await?;
        }

        Ok(child.wait_with_output().await?)
    }
}

#[async_trait]
impl Session for OpenSshSession {
    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    async fn execute(&mut self, command: &str, privileged_run: bool) -> Result<CommandResult> {
        let control = self.control_path()?;
        let remote_command = if privileged_run {
            privileged(command)
        } else {
            command.to_string()
        };
        let args = self.options.ssh_args(&self.target, Some(&control), &remote_command);

        tracing::debug!(host = %self.target, sudo = privileged_run, "Running: {}", command);

        let output = Command::new(&self.options.ssh_program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandResult {
            succeeded: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn put(&mut self, source: &Payload, destination: &str) -> Result<()> {
        let control = self.control_path()?;
        tracing::debug!(host = %self.target, source = %source, destination, "Uploading");

        let output = match source {
            Payload::File(path) => self.put_file(&control, path, destination).await?,
            Payload::Bytes(bytes) => self.put_bytes(&control, bytes, destination).await?,
        };

        if !output.status.success() {
            return Err(RemoteError::TransferFailed {
                target: self.target.to_string(),
                destination: destination.to_string(),
                reason: command_summary(&output),
            });
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(control_dir) = self.control_dir.take() else {
            return Ok(());
        };

        let control = control_dir.path().join(CONTROL_SOCKET);
        let args = self.options.exit_args(&self.target, &control);
        let output = Command::new(&self.options.ssh_program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            tracing::debug!(
                host = %self.target,
                "Master connection did not exit cleanly: {}",
                command_summary(&output)
            );
        }

        tracing::info!(host = %self.target, "Disconnected");
        Ok(())
    }
}

impl Drop for OpenSshSession {
    fn drop(&mut self) {
        // Sessions dropped without close still must not leave a master behind.
        // Blocking, but only reached on paths that skipped `close`.
        if let Some(control_dir) = self.control_dir.take() {
            let control = control_dir.path().join(CONTROL_SOCKET);
            let _ = std::process::Command::new(&self.options.ssh_program)
                .args(self.options.exit_args(&self.target, &control))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}
