//! Controller-specific error types.
//!
//! Fatal errors abort the pass. `DeployTriggerError` is never fatal; it is
//! folded into the report as `TargetState::DeployFailed`.

use crate::report::{ActionKind, ReconcileReport};
use cluster_client::ClusterError;
use kluctl_client::KluctlError;
use thiserror::Error;

/// Problems with the target list or the environment-derived settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// kluctl project file missing or malformed
    #[error(transparent)]
    Project(#[from] KluctlError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Cluster access could not be obtained
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Key material rejected by the remote host
    #[error("Authentication to {host} failed: {detail}")]
    Authentication { host: String, detail: String },

    /// Remote host unreachable
    #[error("Could not reach {host}: {detail}")]
    Transport { host: String, detail: String },

    /// Remote kubeconfig exists but is not readable by the SSH user
    #[error("Cannot read {path} on {host} (is the kubeconfig world-readable?): {detail}")]
    Permission {
        host: String,
        path: String,
        detail: String,
    },

    /// Local scratch space for the fetched kubeconfig
    #[error("Credential scratch file error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetched file is not a usable kubeconfig
    #[error("Invalid kubeconfig fetched from {host}: {detail}")]
    InvalidKubeconfig { host: String, detail: String },

    /// Kube client could not be built from the credentials
    #[error("Kubernetes client error: {0}")]
    Cluster(#[from] ClusterError),
}

/// Errors that abort a reconciliation pass
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Listing existing controllers failed; no diff is possible
    #[error("Failed to list KluctlDeployments in {namespace}: {source}")]
    ClusterRead {
        namespace: String,
        #[source]
        source: ClusterError,
    },

    /// A create or delete failed under the abort policy
    #[error("Failed to {action} KluctlDeployment {name}: {source}")]
    Mutation {
        name: String,
        action: ActionKind,
        /// The pass up to and including the failure
        report: Box<ReconcileReport>,
        #[source]
        source: ClusterError,
    },
}

impl SyncError {
    /// Report of the work done before an aborted pass stopped
    pub fn partial_report(&self) -> Option<&ReconcileReport> {
        match self {
            SyncError::Mutation { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Post-create deploy trigger failed; the KluctlDeployment still exists
#[derive(Debug, Error)]
#[error("Deploy trigger failed for {name}: {source}")]
pub struct DeployTriggerError {
    pub name: String,
    #[source]
    pub source: KluctlError,
}
