//! Kubernetes-backed cluster client
//!
//! Talks to the API server through `kube::Api<KluctlDeployment>` scoped to one
//! namespace.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crds::KluctlDeployment;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use tracing::debug;

/// KluctlDeployment client for a single namespace
#[derive(Clone)]
pub struct KubeClusterClient {
    api: Api<KluctlDeployment>,
    namespace: String,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl KubeClusterClient {
    /// Wrap an existing kube client
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            api: Api::namespaced(client, &namespace),
            namespace,
        }
    }

    /// Build a client from a kubeconfig file, or from the environment when `None`
    ///
    /// `None` follows kube's default resolution: `KUBECONFIG`, then
    /// `~/.kube/config`, then in-cluster service account.
    pub async fn from_kubeconfig(
        kubeconfig: Option<&Path>,
        namespace: impl Into<String>,
    ) -> Result<Self, ClusterError> {
        let client = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    ClusterError::Kubeconfig(format!("failed to read {}: {}", path.display(), e))
                })?;
                let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| {
                        ClusterError::Kubeconfig(format!("failed to load {}: {}", path.display(), e))
                    })?;
                Client::try_from(config)
                    .map_err(|e| ClusterError::Kubeconfig(format!("failed to build client: {}", e)))?
            }
            None => Client::try_default()
                .await
                .map_err(|e| ClusterError::Kubeconfig(format!("failed to infer config: {}", e)))?,
        };

        Ok(Self::new(client, namespace))
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list_controller_names(&self) -> Result<Vec<String>, ClusterError> {
        debug!("Listing KluctlDeployments in namespace {}", self.namespace);

        // Metadata-only listing: objects written by other tools may not match our
        // partial spec model, and only names matter here.
        let list = self
            .api
            .list_metadata(&ListParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, &self.namespace))?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|item| item.metadata.name)
            .collect())
    }

    async fn create_controller(&self, deployment: &KluctlDeployment) -> Result<(), ClusterError> {
        let name = deployment.metadata.name.as_deref().unwrap_or_default();
        debug!("Creating KluctlDeployment {}/{}", self.namespace, name);

        self.api
            .create(&PostParams::default(), deployment)
            .await
            .map_err(|e| ClusterError::from_kube(e, name))?;
        Ok(())
    }

    async fn delete_controller(&self, name: &str) -> Result<(), ClusterError> {
        debug!("Deleting KluctlDeployment {}/{}", self.namespace, name);

        self.api
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, name))?;
        Ok(())
    }
}
