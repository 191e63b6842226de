//! Start the nodepool service

use super::{Workflow, run_in_session};
use crate::error::Result;
use crate::validation::{ensure_no_issues, remote_access_issues};
use async_trait::async_trait;
use nodeprov_remote::{RemoteExecutor, RemoteTarget, Session};

pub struct Start {
    target: RemoteTarget,
}

impl Start {
    pub fn new(target: RemoteTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Workflow for Start {
    fn name(&self) -> &'static str {
        "start"
    }

    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    async fn execute(&self, session: &mut dyn Session) -> Result<()> {
        session.sudo("service nodepool start").await?;
        Ok(())
    }
}

pub async fn start(executor: &dyn RemoteExecutor, target: RemoteTarget) -> Result<()> {
    ensure_no_issues(remote_access_issues(executor, &target).await)?;
    run_in_session(&Start::new(target), executor).await
}
