use crate::HostArgs;
use crate::utils;
use nodeprov_config::Settings;
use nodeprov_core::{OsciInstallArgs, osci_install, osci_start};
use std::path::PathBuf;

pub async fn handle_install(
    settings: &Settings,
    host: HostArgs,
    private_key: PathBuf,
    params: PathBuf,
    repo: Option<String>,
    branch: Option<String>,
) -> anyhow::Result<()> {
    let target = utils::target(settings, host);
    utils::announce("Installing OSCI on", &target);

    osci_install(
        &utils::executor(settings),
        OsciInstallArgs {
            target,
            private_key,
            params,
            repo: repo.unwrap_or_else(|| settings.osci_repo.clone()),
            branch: branch.unwrap_or_else(|| settings.osci_branch.clone()),
        },
    )
    .await?;

    utils::done("OSCI installed");
    Ok(())
}

pub async fn handle_start(settings: &Settings, host: HostArgs) -> anyhow::Result<()> {
    let target = utils::target(settings, host);
    utils::announce("Starting OSCI on", &target);

    osci_start(&utils::executor(settings), target).await?;

    utils::done("OSCI started");
    Ok(())
}
