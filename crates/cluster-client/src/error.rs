//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
///
/// Every variant carries the name of the object (or namespace, for list calls)
/// the failed request was about.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    /// Object does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object with the same name already exists (HTTP 409)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Credentials rejected or lacking RBAC permissions (HTTP 401/403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// API server unreachable or returned an unexpected error
    #[error("Cluster unavailable: {0}")]
    Unavailable(String),

    /// Kubeconfig could not be loaded into a client
    #[error("Invalid kubeconfig: {0}")]
    Kubeconfig(String),
}

impl ClusterError {
    /// Classify a kube error for `subject` (object name or namespace).
    pub fn from_kube(err: kube::Error, subject: &str) -> Self {
        match err {
            kube::Error::Api(ae) => match ae.code {
                404 => ClusterError::NotFound(subject.to_string()),
                409 => ClusterError::AlreadyExists(subject.to_string()),
                401 | 403 => ClusterError::Forbidden(format!("{}: {}", subject, ae.message)),
                code => ClusterError::Unavailable(format!("{}: {} ({})", subject, ae.message, code)),
            },
            other => ClusterError::Unavailable(format!("{}: {}", subject, other)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists(_))
    }
}
