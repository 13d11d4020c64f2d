//! Cluster client for KluctlDeployment objects
//!
//! Narrow list/create/delete surface over the Kubernetes API for the
//! `KluctlDeployment` custom resource, scoped to one namespace.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::from_kubeconfig(None, "kluctl-system").await?;
//! for name in client.list_controller_names().await? {
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockClusterClient};
