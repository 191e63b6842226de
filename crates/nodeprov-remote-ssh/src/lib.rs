//! OpenSSH remote executor for nodeprov
//!
//! Implements [`RemoteExecutor`](nodeprov_remote::RemoteExecutor) on top of
//! the system `ssh` and `scp` binaries.
//!
//! # Requirements
//!
//! - `ssh` and `scp` must be on `PATH`
//! - Authentication must work non-interactively (agent or identity file);
//!   every invocation runs with `BatchMode=yes`
//!
//! Each session opens one multiplexed master connection (`ControlMaster`)
//! whose control socket lives in a private temporary directory. Commands
//! and transfers reuse that connection, and `close` tears it down.
//!
//! # Example
//!
//! ```ignore
//! use nodeprov_remote::{RemoteExecutor, RemoteTarget};
//! use nodeprov_remote_ssh::{OpenSsh, SshOptions};
//!
//! let ssh = OpenSsh::new(SshOptions::default());
//! let target = RemoteTarget::new("ubuntu", "10.0.0.5", 22);
//!
//! let mut session = ssh.connect(&target).await?;
//! let uptime = session.run("uptime", false).await?;
//! session.close().await?;
//! ```

pub mod openssh;

pub use openssh::{OpenSsh, OpenSshSession, SshOptions, sh_quote};
