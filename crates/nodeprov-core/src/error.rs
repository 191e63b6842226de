use nodeprov_remote::RemoteError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Pre-flight checks failed; nothing was changed on any host.
    #[error("Pre-flight checks failed:\n{}", .0.join("\n"))]
    Preflight(Vec<String>),

    #[error("Invalid parameter file {path}:\n{}", .issues.join("\n"))]
    EnvFile { path: PathBuf, issues: Vec<String> },

    #[error("Environment variable {0} is defined by more than one layer")]
    DuplicateVariable(String),

    #[error("Template render error: {0}")]
    Template(String),

    #[error("Invalid nodepool configuration: {0}")]
    Topology(#[from] serde_yaml::Error),

    #[error(
        "Keypair \"{keypair}\" already exists at regions: {} Please remove them manually or use --remove",
        .regions.join(",")
    )]
    KeypairConflict {
        keypair: String,
        regions: Vec<String>,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("IO error: {path}\nreason: {message}")]
    Io { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
