//! Remote execution contract for nodeprov
//!
//! Every workflow reaches a host exclusively through the traits defined
//! here. A [`RemoteExecutor`] opens [`Session`]s against a single
//! [`RemoteTarget`] and answers the read-only reachability probes used
//! by pre-flight validation.
//!
//! ```text
//! RemoteExecutor ──connect──▶ Session ──run / sudo / put──▶ host
//!        │                       │
//!        └─ check_connection     └─ close (always, on every exit path)
//!        └─ check_sudo
//! ```
//!
//! Implementations:
//!
//! - `nodeprov-remote-ssh`: the system OpenSSH client
//! - [`fake::FakeExecutor`]: in-memory recorder for tests

pub mod error;
pub mod fake;
pub mod session;

// Re-exports
pub use error::{RemoteError, Result};
pub use session::{CommandResult, Payload, RemoteExecutor, RemoteTarget, Session};
