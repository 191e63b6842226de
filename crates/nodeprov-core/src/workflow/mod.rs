//! Provisioning workflows
//!
//! Every workflow follows the same shape:
//!
//! ```text
//! pre-flight checks ──▶ build environment ──▶ connect
//!        │                                       │
//!   (issues: stop,                     steps (put / run / sudo)
//!    nothing touched)                            │
//!                                    remove pushed artifacts (best effort)
//!                                                │
//!                                              close
//! ```
//!
//! The public entry points ([`install`], [`configure`], ...) run the
//! pre-flight checks and build the workflow; [`run_in_session`] owns the
//! session lifecycle so that cleanup and release happen on every path.

pub mod configure;
pub mod install;
pub mod osci;
pub mod start;
pub mod upload_keys;

pub use configure::{Configure, ConfigureArgs, configure};
pub use install::{Install, InstallArgs, install};
pub use osci::{OsciInstall, OsciInstallArgs, OsciStart, osci_install, osci_start};
pub use start::{Start, start};
pub use upload_keys::{UploadKeys, UploadKeysArgs, upload_keys};

use crate::error::Result;
use async_trait::async_trait;
use nodeprov_remote::{RemoteExecutor, RemoteTarget, Session};
use tracing::{debug, info, warn};

/// A bounded sequence of remote steps against one host.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn target(&self) -> &RemoteTarget;

    /// Remote paths pushed by [`execute`](Workflow::execute) that must not
    /// outlive the workflow
    fn artifacts(&self) -> Vec<String> {
        Vec::new()
    }

    async fn execute(&self, session: &mut dyn Session) -> Result<()>;
}

/// Connect, execute, clean up and close.
///
/// Artifact removal and close run whether or not the steps succeeded, and
/// their own failures are logged without changing the outcome.
pub async fn run_in_session(workflow: &dyn Workflow, executor: &dyn RemoteExecutor) -> Result<()> {
    let target = workflow.target();
    let mut session = executor.connect(target).await?;
    info!(workflow = workflow.name(), host = %target, "Session opened");

    let outcome = workflow.execute(session.as_mut()).await;
    if let Err(ref e) = outcome {
        warn!(workflow = workflow.name(), error = %e, "Workflow aborted");
    }

    remove_artifacts(session.as_mut(), &workflow.artifacts()).await;

    if let Err(e) = session.close().await {
        warn!(host = %target, error = %e, "Failed to close session");
    }

    if outcome.is_ok() {
        info!(workflow = workflow.name(), host = %target, "Workflow completed");
    }
    outcome
}

async fn remove_artifacts(session: &mut dyn Session, artifacts: &[String]) {
    for path in artifacts {
        match session.run(&format!("rm -f {path}"), true).await {
            Ok(result) if result.succeeded => debug!(path = %path, "Removed artifact"),
            Ok(result) => warn!(path = %path, "Could not remove artifact: {}", result.stderr.trim()),
            Err(e) => warn!(path = %path, error = %e, "Could not remove artifact"),
        }
    }
}
