//! nova CLI command lines for keypair management
//!
//! Commands run as the service user, from the service's virtualenv, with
//! the cloud parameters and the target region injected on the command line.

use crate::env::{Environment, ServiceIdentity};

pub const NOVA_BIN: &str = "/opt/nodepool/env/bin/nova";

/// Builds region-scoped `nova keypair-*` invocations.
#[derive(Debug, Clone)]
pub struct NovaCommands {
    identity: ServiceIdentity,
    cloud: Environment,
}

impl NovaCommands {
    pub fn new(identity: ServiceIdentity, cloud: Environment) -> Self {
        Self { identity, cloud }
    }

    fn nova(&self, region: &str, subcommand: &str) -> String {
        let mut nova_env = self.cloud.clone();
        nova_env.set("OS_REGION_NAME", region);
        format!(
            "sudo -u {user} /bin/sh -c \"HOME={home} {nova_env} {NOVA_BIN} {subcommand}\"",
            user = self.identity.username,
            home = self.identity.home,
            nova_env = nova_env.bashline(),
        )
    }

    pub fn keypair_show(&self, region: &str, name: &str) -> String {
        self.nova(region, &format!("keypair-show {name}"))
    }

    pub fn keypair_delete(&self, region: &str, name: &str) -> String {
        self.nova(region, &format!("keypair-delete {name}"))
    }

    pub fn keypair_add(&self, region: &str, name: &str, public_key_path: &str) -> String {
        self.nova(region, &format!("keypair-add --pub-key {public_key_path} {name}"))
    }
}
