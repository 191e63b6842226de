use crate::HostArgs;
use colored::Colorize;
use nodeprov_config::{Settings, expand_home};
use nodeprov_remote::RemoteTarget;
use nodeprov_remote_ssh::{OpenSsh, SshOptions};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout stays readable. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

pub fn target(settings: &Settings, host: HostArgs) -> RemoteTarget {
    RemoteTarget::new(host.username, host.host, host.port.unwrap_or(settings.port))
}

pub fn executor(settings: &Settings) -> OpenSsh {
    OpenSsh::new(SshOptions {
        identity_file: settings.ssh.identity_file.as_deref().map(expand_home),
        connect_timeout: settings.ssh.connect_timeout,
        strict_host_key_checking: settings.ssh.strict_host_key_checking.clone(),
        ..SshOptions::default()
    })
}

pub fn announce(action: &str, target: &RemoteTarget) {
    println!("{} {}", action.green(), target.to_string().cyan());
}

pub fn done(message: &str) {
    println!("{}", format!("✓ {message}").green().bold());
}
