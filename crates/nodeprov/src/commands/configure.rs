use crate::HostArgs;
use crate::utils;
use nodeprov_config::Settings;
use nodeprov_core::{ConfigureArgs, configure};
use std::path::PathBuf;

/// Positional inputs of `configure`
pub struct Inputs {
    pub openrc: PathBuf,
    pub image_name: String,
    pub nodepool_keyfile: PathBuf,
    pub jenkins_keyfile: PathBuf,
    pub rackspace_password: String,
    pub min_ready: Option<u32>,
}

pub async fn handle(settings: &Settings, host: HostArgs, inputs: Inputs) -> anyhow::Result<()> {
    let target = utils::target(settings, host);
    utils::announce("Configuring nodepool on", &target);

    configure(
        &utils::executor(settings),
        ConfigureArgs {
            target,
            openrc: inputs.openrc,
            image_name: inputs.image_name,
            nodepool_keyfile: inputs.nodepool_keyfile,
            jenkins_keyfile: inputs.jenkins_keyfile,
            rackspace_password: inputs.rackspace_password,
            min_ready: inputs.min_ready.unwrap_or(settings.min_ready),
        },
    )
    .await?;

    utils::done("Nodepool configured");
    Ok(())
}
