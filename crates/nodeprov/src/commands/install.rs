use crate::HostArgs;
use crate::utils;
use nodeprov_config::Settings;
use nodeprov_core::{InstallArgs, install};

pub async fn handle(
    settings: &Settings,
    host: HostArgs,
    repo: Option<String>,
    branch: Option<String>,
) -> anyhow::Result<()> {
    let target = utils::target(settings, host);
    let repo = repo.unwrap_or_else(|| settings.nodepool_repo.clone());
    let branch = branch.unwrap_or_else(|| settings.nodepool_branch.clone());

    utils::announce("Installing nodepool on", &target);
    println!("  {repo} ({branch})");

    install(
        &utils::executor(settings),
        InstallArgs {
            target,
            repo,
            branch,
        },
    )
    .await?;

    utils::done("Nodepool installed");
    Ok(())
}
