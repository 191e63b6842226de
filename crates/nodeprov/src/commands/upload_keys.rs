use crate::HostArgs;
use crate::utils;
use colored::Colorize;
use nodeprov_config::Settings;
use nodeprov_core::{UploadKeysArgs, upload_keys};
use std::path::PathBuf;

pub async fn handle(
    settings: &Settings,
    host: HostArgs,
    openrc: PathBuf,
    remove: bool,
) -> anyhow::Result<()> {
    let target = utils::target(settings, host);
    utils::announce("Uploading nodepool keypair from", &target);
    if remove {
        println!("  {}", "Existing keypairs will be replaced".yellow());
    }

    upload_keys(
        &utils::executor(settings),
        UploadKeysArgs {
            target,
            openrc,
            remove,
        },
    )
    .await?;

    utils::done("Keypair uploaded");
    Ok(())
}
