//! Provisioning logic for nodepool hosts
//!
//! - [`validation`]: pre-flight checks that run before any host is touched
//! - [`env`]: layered environments handed to remote scripts
//! - [`bash_env`]: restricted `KEY=VALUE` parameter files (openrc)
//! - [`nova`]: region-scoped keypair command lines
//! - [`topology`] / [`template`]: nodepool.yaml rendering and in-use regions
//! - [`keypairs`]: multi-region keypair reconciliation
//! - [`workflow`]: install, configure, start, upload-keys and osci

pub mod bash_env;
pub mod env;
pub mod error;
pub mod keypairs;
pub mod nova;
pub mod scripts;
pub mod template;
pub mod topology;
pub mod validation;
pub mod workflow;

pub use env::{ConfigEnv, Environment, InstallEnv, ServiceIdentity};
pub use error::{CoreError, Result};
pub use keypairs::{Keypair, ReconcileReport};
pub use nova::NovaCommands;
pub use validation::{Check, first_issue};
pub use workflow::{
    ConfigureArgs, InstallArgs, OsciInstallArgs, UploadKeysArgs, Workflow, configure, install,
    osci_install, osci_start, run_in_session, start, upload_keys,
};
