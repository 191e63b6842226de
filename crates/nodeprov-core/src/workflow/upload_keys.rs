//! Publish the service's public key as a keypair in every in-use region

use super::{Workflow, run_in_session};
use crate::bash_env;
use crate::env::ConfigEnv;
use crate::error::Result;
use crate::keypairs::{self, Keypair};
use crate::nova::NovaCommands;
use crate::template::render_nodepool_topology;
use crate::topology;
use crate::validation::{ensure_no_issues, file_access_issues, remote_access_issues};
use async_trait::async_trait;
use nodeprov_remote::{RemoteExecutor, RemoteTarget, Session};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct UploadKeysArgs {
    pub target: RemoteTarget,
    /// Cloud parameter file (openrc)
    pub openrc: PathBuf,
    /// Replace keypairs that already exist instead of refusing
    pub remove: bool,
}

pub struct UploadKeys {
    target: RemoteTarget,
    nova: NovaCommands,
    regions: Vec<String>,
    keypair: Keypair,
    remove: bool,
}

impl UploadKeys {
    pub fn new(target: RemoteTarget, config_env: &ConfigEnv, remove: bool) -> Result<Self> {
        let yaml = render_nodepool_topology()?;
        let regions = topology::in_use_regions(&yaml)?;
        info!(regions = ?regions, "Regions in use");

        Ok(Self {
            target,
            nova: NovaCommands::new(config_env.identity.clone(), config_env.cloud.clone()),
            regions,
            keypair: Keypair::for_identity(&config_env.identity),
            remove,
        })
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }
}


#[async_trait]
impl Workflow for UploadKeys {
    fn name(&self) -> &'static str {
        "upload-keys"
    }

    fn target(&self) -> &RemoteTarget {
        &self.target
    }

    async fn execute(&self, session: &mut dyn Session) -> Result<()> {
        let report = keypairs::reconcile(
            session,
            &self.nova,
            &self.regions,
            &self.keypair,
            self.remove,
        )
        .await?;
        info!(
            keypair = %self.keypair.name,
            deleted = ?report.deleted,
            added = ?report.added,
            "Keypair reconciled"
        );
        Ok(())
    }
}

pub async fn upload_keys(executor: &dyn RemoteExecutor, args: UploadKeysArgs) -> Result<()> {
    let mut issues = remote_access_issues(executor, &args.target).await;
    issues.extend(file_access_issues(&args.openrc).await);
    ensure_no_issues(issues)?;

    let cloud = bash_env::load(&args.openrc)?;
    let workflow = UploadKeys::new(args.target, &ConfigEnv::for_cloud(cloud), args.remove)?;
    run_in_session(&workflow, executor).await
}
