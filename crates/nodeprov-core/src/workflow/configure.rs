//! Push nodepool configuration, keys and cloud parameters

use super::{Workflow, run_in_session};
use crate::bash_env;
use crate::env::{ConfigEnv, Environment};
use crate::error::Result;
use crate::scripts;
use crate::template::render_nodepool_config;
use crate::validation::{Check, ensure_no_issues, file_access_issues, first_issue, remote_access_issues};
use async_trait::async_trait;
use nodeprov_remote::{Payload, RemoteExecutor, RemoteTarget, Session};
use std::path::PathBuf;

const REMOTE_SCRIPT: &str = "nodepool_config.sh";
const REMOTE_CONFIG: &str = "nodepool.yaml";
const REMOTE_NODEPOOL_KEY: &str = "nodepool.priv";
const REMOTE_JENKINS_KEY: &str = "jenkins.priv";

#[derive(Debug, Clone)]
pub struct ConfigureArgs {
    pub target: RemoteTarget,
    /// Cloud parameter file (openrc)
    pub openrc: PathBuf,
    pub image_name: String,
    /// Private key nodepool uses to prepare nodes
    pub nodepool_keyfile: PathBuf,
    /// Private key jenkins uses to reach nodes
    pub jenkins_keyfile: PathBuf,
    pub rackspace_password: String,
    pub min_ready: u32,
}

pub struct Configure {
    target: RemoteTarget,
    env: Environment,
    nodepool_config: String,
    nodepool_keyfile: PathBuf,
    jenkins_keyfile: PathBuf,
}

impl Configure {
    pub fn new(
        target: RemoteTarget,
        config_env: &ConfigEnv,
        nodepool_keyfile: PathBuf,
        jenkins_keyfile: PathBuf,
    ) -> Result<Self> {
        let env = config_env.environment()?;
        let nodepool_config = render_nodepool_config(&env)?;
        Ok(Self {
            target,
            env,
            nodepool_config,
            nodepool_keyfile,
            jenkins_keyfile,
        })
    }

    pub fn nodepool_config(&self) -> &str {
        &self.nodepool_config
    }
}

#[async_trait]
impl Workflow for Configure {
    fn name(&self) -> &'static str {
        "configure"
    }

    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    fn artifacts(&self) -> Vec<String> {
        [REMOTE_SCRIPT, REMOTE_CONFIG, REMOTE_NODEPOOL_KEY, REMOTE_JENKINS_KEY]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    async fn execute(&self, session: &mut dyn Session) -> Result<()> {
        session
            .put(&Payload::bytes(scripts::NODEPOOL_CONFIGURE), REMOTE_SCRIPT)
            .await?;
        session
            .put(&Payload::bytes(self.nodepool_config.as_bytes()), REMOTE_CONFIG)
            .await?;
        session
            .put(&Payload::file(&self.nodepool_keyfile), REMOTE_NODEPOOL_KEY)
            .await?;
        session
            .put(&Payload::file(&self.jenkins_keyfile), REMOTE_JENKINS_KEY)
            .await?;
        session
            .run(&format!("{} bash {REMOTE_SCRIPT}", self.env.bashline()), false)
            .await?;
        Ok(())
    }
}

async fn issues_for(executor: &dyn RemoteExecutor, args: &ConfigureArgs) -> Vec<String> {
    let password_safe = bash_env::is_shell_safe(&args.rackspace_password);
    let image_safe = bash_env::is_shell_safe(&args.image_name);

    let mut issues = remote_access_issues(executor, &args.target).await;
    issues.extend(file_access_issues(&args.openrc).await);
    issues.extend(file_access_issues(&args.nodepool_keyfile).await);
    issues.extend(file_access_issues(&args.jenkins_keyfile).await);
    issues.extend(
        first_issue(vec![
            Check::new(
                move || image_safe,
                "Image name contains whitespace or shell metacharacters",
            ),
            Check::new(
                move || password_safe,
                "Rackspace password contains whitespace or shell metacharacters",
            ),
        ])
        .await,
    );
    issues
}

pub async fn configure(executor: &dyn RemoteExecutor, args: ConfigureArgs) -> Result<()> {
    ensure_no_issues(issues_for(executor, &args).await)?;

    let cloud = bash_env::load(&args.openrc)?;
    let config_env = ConfigEnv::new(cloud, args.image_name, args.min_ready, args.rackspace_password);
    let workflow = Configure::new(
        args.target,
        &config_env,
        args.nodepool_keyfile,
        args.jenkins_keyfile,
    )?;
    run_in_session(&workflow, executor).await
}
