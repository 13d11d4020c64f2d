//! ClusterClient trait for mocking
//!
//! The reconciler only ever needs three calls against the cluster. Keeping them
//! behind a trait lets unit tests run against an in-memory store.

use crate::error::ClusterError;
use crds::KluctlDeployment;

/// Trait for KluctlDeployment operations in a single namespace
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// Namespace every call is scoped to
    fn namespace(&self) -> &str;

    /// Names of all KluctlDeployment objects in the namespace, in API order
    async fn list_controller_names(&self) -> Result<Vec<String>, ClusterError>;

    /// Create a KluctlDeployment; an existing name is `AlreadyExists`
    async fn create_controller(&self, deployment: &KluctlDeployment) -> Result<(), ClusterError>;

    /// Delete a KluctlDeployment by name; a missing name is `NotFound`
    async fn delete_controller(&self, name: &str) -> Result<(), ClusterError>;
}
