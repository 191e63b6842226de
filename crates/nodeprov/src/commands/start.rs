use crate::HostArgs;
use crate::utils;
use nodeprov_config::Settings;

pub async fn handle(settings: &Settings, host: HostArgs) -> anyhow::Result<()> {
    let target = utils::target(settings, host);
    utils::announce("Starting nodepool on", &target);

    nodeprov_core::start(&utils::executor(settings), target).await?;

    utils::done("Nodepool started");
    Ok(())
}
