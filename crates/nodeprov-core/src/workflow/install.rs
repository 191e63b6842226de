//! Install nodepool from source on a fresh host

use super::{Workflow, run_in_session};
use crate::bash_env;
use crate::env::{Environment, InstallEnv};
use crate::error::Result;
use crate::scripts;
use crate::validation::{Check, ensure_no_issues, first_issue, remote_access_issues};
use async_trait::async_trait;
use nodeprov_remote::{Payload, RemoteExecutor, RemoteTarget, Session};

const REMOTE_SCRIPT: &str = "install.sh";

#[derive(Debug, Clone)]
pub struct InstallArgs {
    pub target: RemoteTarget,
    pub repo: String,
    pub branch: String,
}

pub struct Install {
    target: RemoteTarget,
    env: Environment,
}

impl Install {
    pub fn new(target: RemoteTarget, install_env: &InstallEnv) -> Result<Self> {
        Ok(Self {
            target,
            env: install_env.environment()?,
        })
    }
}

#[async_trait]
impl Workflow for Install {
    fn name(&self) -> &'static str {
        "install"
    }

    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    fn artifacts(&self) -> Vec<String> {
        vec![REMOTE_SCRIPT.to_string()]
    }

    async fn execute(&self, session: &mut dyn Session) -> Result<()> {
        session
            .put(&Payload::bytes(scripts::NODEPOOL_INSTALL), REMOTE_SCRIPT)
            .await?;
        session
            .run(&format!("{} bash {REMOTE_SCRIPT}", self.env.bashline()), false)
            .await?;
        Ok(())
    }
}

async fn issues_for(executor: &dyn RemoteExecutor, args: &InstallArgs) -> Vec<String> {
    let repo_safe = bash_env::is_shell_safe(&args.repo);
    let branch_safe = bash_env::is_shell_safe(&args.branch);

    let mut issues = remote_access_issues(executor, &args.target).await;
    issues.extend(
        first_issue(vec![Check::new(
            move || repo_safe,
            "Nodepool repository contains whitespace or shell metacharacters",
        )])
        .await,
    );
    issues.extend(
        first_issue(vec![Check::new(
            move || branch_safe,
            "Nodepool branch contains whitespace or shell metacharacters",
        )])
        .await,
    );
    issues
}

pub async fn install(executor: &dyn RemoteExecutor, args: InstallArgs) -> Result<()> {
    ensure_no_issues(issues_for(executor, &args).await)?;

    let workflow = Install::new(args.target, &InstallEnv::new(args.repo, args.branch))?;
    run_in_session(&workflow, executor).await
}
