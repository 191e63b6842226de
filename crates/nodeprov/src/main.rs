mod commands;
mod utils;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use nodeprov_config::Settings;
use nodeprov_core::CoreError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nodeprov")]
#[command(about = "Provision nodepool and OpenStack Citrix CI hosts over SSH", long_about = None)]
struct Cli {
    /// Log debug output (including remote commands) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Host every remote subcommand works on
#[derive(Args, Debug, Clone)]
pub struct HostArgs {
    /// Username on the target host
    pub username: String,
    /// Target host
    pub host: String,
    /// SSH port (default: from settings, else 22)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install nodepool from source
    Install {
        #[command(flatten)]
        host: HostArgs,
        /// Nodepool repository
        #[arg(long)]
        nodepool_repo: Option<String>,
        /// Nodepool branch
        #[arg(long)]
        nodepool_branch: Option<String>,
    },
    /// Configure nodepool on a remote machine
    Configure {
        #[command(flatten)]
        host: HostArgs,
        /// OpenRc file to access the cloud
        openrc: PathBuf,
        /// Image name to be used
        image_name: String,
        /// SSH key used to prepare nodes
        nodepool_keyfile: PathBuf,
        /// SSH key used by jenkins
        jenkins_keyfile: PathBuf,
        /// Rackspace password
        rackspace_password: String,
        /// Number of ready nodes to keep per image
        #[arg(long)]
        min_ready: Option<u32>,
    },
    /// Start the nodepool service
    Start {
        #[command(flatten)]
        host: HostArgs,
    },
    /// Upload the nodepool public key to every region in use
    UploadKeys {
        #[command(flatten)]
        host: HostArgs,
        /// OpenRc file to access the cloud
        openrc: PathBuf,
        /// Replace keypairs that already exist
        #[arg(long)]
        remove: bool,
    },
    /// Install OpenStack Citrix CI
    OsciInstall {
        /// Private key used to reach gerrit (the .pub must sit next to it)
        private_key: PathBuf,
        #[command(flatten)]
        host: HostArgs,
        /// OSCI settings file
        params: PathBuf,
        /// OSCI repository
        #[arg(long)]
        osci_repo: Option<String>,
        /// OSCI branch
        #[arg(long)]
        osci_branch: Option<String>,
    },
    /// Start OpenStack Citrix CI services
    OsciStart {
        #[command(flatten)]
        host: HostArgs,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    if matches!(command, Commands::Version) {
        println!("nodeprov {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = Settings::load()?;
    tracing::debug!(port = settings.port, min_ready = settings.min_ready, "Settings loaded");

    match command {
        Commands::Install {
            host,
            nodepool_repo,
            nodepool_branch,
        } => {
            commands::install::handle(&settings, host, nodepool_repo, nodepool_branch).await?;
        }
        Commands::Configure {
            host,
            openrc,
            image_name,
            nodepool_keyfile,
            jenkins_keyfile,
            rackspace_password,
            min_ready,
        } => {
            commands::configure::handle(
                &settings,
                host,
                commands::configure::Inputs {
                    openrc,
                    image_name,
                    nodepool_keyfile,
                    jenkins_keyfile,
                    rackspace_password,
                    min_ready,
                },
            )
            .await?;
        }
        Commands::Start { host } => {
            commands::start::handle(&settings, host).await?;
        }
        Commands::UploadKeys {
            host,
            openrc,
            remove,
        } => {
            commands::upload_keys::handle(&settings, host, openrc, remove).await?;
        }
        Commands::OsciInstall {
            private_key,
            host,
            params,
            osci_repo,
            osci_branch,
        } => {
            commands::osci::handle_install(
                &settings,
                host,
                private_key,
                params,
                osci_repo,
                osci_branch,
            )
            .await?;
        }
        Commands::OsciStart { host } => {
            commands::osci::handle_start(&settings, host).await?;
        }
        Commands::Version => {}
    }

    Ok(())
}

/// Pre-flight issues are listed one per line; anything else is a single error.
fn report(error: &anyhow::Error) {
    if let Some(CoreError::Preflight(issues)) = error.downcast_ref::<CoreError>() {
        for issue in issues {
            eprintln!("{} {}", "ERROR:".red().bold(), issue);
        }
        return;
    }
    eprintln!("{} {:#}", "Error:".red().bold(), error);
}
