//! OpenStack Citrix CI (osci) install and start

use super::{Workflow, run_in_session};
use crate::error::Result;
use crate::scripts;
use crate::validation::{ensure_no_issues, file_access_issues, public_key_for, remote_access_issues};
use async_trait::async_trait;
use nodeprov_remote::{Payload, RemoteExecutor, RemoteTarget, Session};
use std::path::PathBuf;

const REMOTE_SCRIPT: &str = "osci_installscript.sh";
const REMOTE_SETTINGS: &str = "osci.config";
const GERRIT_KEY: &str = ".ssh/citrix_gerrit";
const GERRIT_PUBLIC_KEY: &str = ".ssh/citrix_gerrit.pub";

#[derive(Debug, Clone)]
pub struct OsciInstallArgs {
    pub target: RemoteTarget,
    /// Private key used to talk to gerrit; `<key>.pub` must sit next to it
    pub private_key: PathBuf,
    /// osci settings file
    pub params: PathBuf,
    pub repo: String,
    pub branch: String,
}

pub struct OsciInstall {
    target: RemoteTarget,
    private_key: PathBuf,
    params: PathBuf,
    repo: String,
    branch: String,
}

impl OsciInstall {
    pub fn new(args: OsciInstallArgs) -> Self {
        Self {
            target: args.target,
            private_key: args.private_key,
            params: args.params,
            repo: args.repo,
            branch: args.branch,
        }
    }
}

#[async_trait]
impl Workflow for OsciInstall {
    fn name(&self) -> &'static str {
        "osci-install"
    }

    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    // The gerrit key pair and settings stay on the host.
    fn artifacts(&self) -> Vec<String> {
        vec![REMOTE_SCRIPT.to_string()]
    }

    async fn execute(&self, session: &mut dyn Session) -> Result<()> {
        session.run("mkdir -p .ssh", false).await?;
        session
            .put(&Payload::file(&self.private_key), GERRIT_KEY)
            .await?;
        session
            .put(&Payload::file(public_key_for(&self.private_key)), GERRIT_PUBLIC_KEY)
            .await?;
        session.run(&format!("chmod 0400 {GERRIT_KEY}"), false).await?;
        session
            .put(&Payload::file(&self.params), REMOTE_SETTINGS)
            .await?;
        session
            .put(&Payload::bytes(scripts::OSCI_INSTALL), REMOTE_SCRIPT)
            .await?;
        session
            .run(
                &format!("bash {REMOTE_SCRIPT} \"{}\" \"{}\"", self.repo, self.branch),
                false,
            )
            .await?;
        Ok(())
    }
}

pub async fn osci_install(executor: &dyn RemoteExecutor, args: OsciInstallArgs) -> Result<()> {
    let mut issues = Vec::new();
    issues.extend(file_access_issues(&args.private_key).await);
    issues.extend(file_access_issues(&public_key_for(&args.private_key)).await);
    issues.extend(file_access_issues(&args.params).await);
    issues.extend(remote_access_issues(executor, &args.target).await);
    ensure_no_issues(issues)?;

    run_in_session(&OsciInstall::new(args), executor).await
}

pub struct OsciStart {
    target: RemoteTarget,
}

impl OsciStart {
    pub fn new(target: RemoteTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Workflow for OsciStart {
    fn name(&self) -> &'static str {
        "osci-start"
    }

    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    async fn execute(&self, session: &mut dyn Session) -> Result<()> {
        session.sudo("service citrix-ci start").await?;
        session.sudo("service citrix-ci-gerritwatch start").await?;
        Ok(())
    }
}

pub async fn osci_start(executor: &dyn RemoteExecutor, target: RemoteTarget) -> Result<()> {
    ensure_no_issues(remote_access_issues(executor, &target).await)?;
    run_in_session(&OsciStart::new(target), executor).await
}
