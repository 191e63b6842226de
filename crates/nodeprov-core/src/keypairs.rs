//! Multi-region keypair reconciliation
//!
//! The state of every in-use region is read before anything is written:
//!
//! 1. `keypair-show` in each region; a zero exit means the key exists there
//! 2. existing keys without `remove` abort the run before any mutation
//! 3. with `remove`, delete the key in exactly the regions where it exists
//! 4. add the key in every in-use region
//!
//! `keypair-show` is expected to exit non-zero when the key is absent, so
//! the probe runs with failures ignored. A transport error is still fatal.

use crate::env::ServiceIdentity;
use crate::error::{CoreError, Result};
use crate::nova::NovaCommands;
use nodeprov_remote::Session;
use tracing::{debug, info};

/// The keypair to publish in each region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    pub name: String,
    /// Path of the public key on the remote host
    pub public_key_path: String,
}

impl Keypair {
    pub fn for_identity(identity: &ServiceIdentity) -> Self {
        Self {
            name: identity.key_name.clone(),
            public_key_path: identity.public_key_path(),
        }
    }
}

/// Whether the keypair exists in a region, observed during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionKeyState {
    pub region: String,
    pub present: bool,
}

/// What a reconciliation run did, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub existing: Vec<String>,
    pub deleted: Vec<String>,
    pub added: Vec<String>,
}

/// Probe every region for the keypair. Read-only.
pub async fn survey(
    session: &mut dyn Session,
    nova: &NovaCommands,
    regions: &[String],
    keypair: &Keypair,
) -> Result<Vec<RegionKeyState>> {
    let mut states = Vec::with_capacity(regions.len());
    for region in regions {
        let result = session
            .run(&nova.keypair_show(region, &keypair.name), true)
            .await?;
        debug!(region = %region, present = result.succeeded, "Surveyed keypair");
        states.push(RegionKeyState {
            region: region.clone(),
            present: result.succeeded,
        });
    }
    Ok(states)
}

/// Make `keypair` present in every region of `regions`.
pub async fn reconcile(
    session: &mut dyn Session,
    nova: &NovaCommands,
    regions: &[String],
    keypair: &Keypair,
    remove: bool,
) -> Result<ReconcileReport> {
    let states = survey(session, nova, regions, keypair).await?;
    let existing: Vec<String> = states
        .into_iter()
        .filter(|s| s.present)
        .map(|s| s.region)
        .collect();

    if !existing.is_empty() && !remove {
        return Err(CoreError::KeypairConflict {
            keypair: keypair.name.clone(),
            regions: existing,
        });
    }

    let mut report = ReconcileReport {
        existing,
        ..ReconcileReport::default()
    };

    if remove {
        for region in &report.existing {
            session
                .run(&nova.keypair_delete(region, &keypair.name), false)
                .await?;
            info!(region = %region, keypair = %keypair.name, "Deleted keypair");
            report.deleted.push(region.clone());
        }
    }

    for region in regions {
        session
            .run(
                &nova.keypair_add(region, &keypair.name, &keypair.public_key_path),
                false,
            )
            .await?;
        info!(region = %region, keypair = %keypair.name, "Added keypair");
        report.added.push(region.clone());
    }

    Ok(report)
}
