//! kluctl client errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KluctlError {
    /// The project file does not exist
    #[error("kluctl project file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The project file is not valid YAML or lacks `targets`
    #[error("failed to parse {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The project file exists but could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The kluctl binary could not be started
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `kluctl gitops deploy` exited nonzero
    #[error("kluctl gitops deploy failed for {name} (exit code {code:?}): {stderr}")]
    DeployFailed {
        name: String,
        code: Option<i32>,
        stderr: String,
    },
}
