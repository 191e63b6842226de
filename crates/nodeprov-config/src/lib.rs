//! Operator settings for nodeprov
//!
//! Settings come from an optional YAML file. Every key has a built-in
//! default, and command-line flags override both.
//!
//! ```yaml
//! port: 2222
//! min_ready: 4
//! ssh:
//!   identity_file: ~/.ssh/ci_rsa
//!   strict_host_key_checking: accept-new
//! ```

pub mod error;

pub use error::*;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the settings file location.
pub const CONFIG_PATH_ENV: &str = "NODEPROV_CONFIG_PATH";

pub const DEFAULT_NODEPOOL_REPO: &str = "https://github.com/citrix-openstack/nodepool.git";
pub const DEFAULT_OSCI_REPO: &str = "https://github.com/citrix-openstack/openstack-citrix-ci.git";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub port: u16,
    pub nodepool_repo: String,
    pub nodepool_branch: String,
    pub min_ready: u32,
    pub osci_repo: String,
    pub osci_branch: String,
    pub ssh: SshSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 22,
            nodepool_repo: DEFAULT_NODEPOOL_REPO.to_string(),
            nodepool_branch: "master".to_string(),
            min_ready: 8,
            osci_repo: DEFAULT_OSCI_REPO.to_string(),
            osci_branch: "master".to_string(),
            ssh: SshSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshSettings {
    pub identity_file: Option<PathBuf>,
    /// Seconds
    pub connect_timeout: u64,
    pub strict_host_key_checking: Option<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            identity_file: None,
            connect_timeout: 10,
            strict_host_key_checking: None,
        }
    }
}

/// `$NODEPROV_CONFIG_PATH`, else `<config dir>/nodeprov/config.yaml`
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(config_dir.join("nodeprov").join("config.yaml"))
}

impl Settings {
    /// Parse a settings document. Missing keys take their defaults.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        // An empty file deserializes as null
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path`; a file that does not exist yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "Loaded settings");
                Self::parse(path, &text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Settings from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
