//! KluctlDeployment mutations.
//!
//! Creating a controller and forcing its first deploy are separate steps: the
//! create makes the name exist, the deploy merely shortens the wait for the
//! first interval tick. A failed deploy never undoes the create.

use crate::config::{CONTROLLER_INTERVAL, SourceConfig};
use crate::credentials::ClusterCredentials;
use crate::error::DeployTriggerError;
use crate::report::TargetState;
use cluster_client::{ClusterClientTrait, ClusterError};
use crds::{GitProjectSource, GitRef, KluctlDeployment, KluctlDeploymentSpec, ProjectSource};
use kluctl_client::{CommandRunner, KluctlCli, TokioCommandRunner};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ControllerMutator<R: CommandRunner = TokioCommandRunner> {
    cluster: Arc<dyn ClusterClientTrait>,
    kluctl: KluctlCli<R>,
    source: SourceConfig,
    context: String,
}

impl<R: CommandRunner> std::fmt::Debug for ControllerMutator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerMutator")
            .field("namespace", &self.cluster.namespace())
            .field("source", &self.source)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> ControllerMutator<R> {
    pub fn new(
        cluster: Arc<dyn ClusterClientTrait>,
        kluctl: KluctlCli<R>,
        source: SourceConfig,
        context: impl Into<String>,
    ) -> Self {
        Self {
            cluster,
            kluctl,
            source,
            context: context.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        self.cluster.namespace()
    }

    /// The KluctlDeployment object for target `name`
    pub fn build_controller(&self, name: &str) -> KluctlDeployment {
        let spec = KluctlDeploymentSpec {
            interval: CONTROLLER_INTERVAL.to_string(),
            source: ProjectSource {
                git: GitProjectSource {
                    url: self.source.url.clone(),
                    git_ref: Some(GitRef::branch(&self.source.git_ref)),
                    path: Some(self.source.path.clone()),
                },
            },
            target: Some(name.to_string()),
            context: Some(self.context.clone()),
            prune: true,
            delete: true,
        };

        let mut deployment = KluctlDeployment::new(name, spec);
        deployment.metadata.namespace = Some(self.namespace().to_string());
        deployment
    }

    /// Create the controller for `name`
    pub async fn create(&self, name: &str) -> Result<TargetState, ClusterError> {
        let deployment = self.build_controller(name);
        self.cluster.create_controller(&deployment).await?;
        info!("Created KluctlDeployment {}/{}", self.namespace(), name);
        Ok(TargetState::PendingDeploy)
    }

    /// Delete the controller for `name`
    pub async fn delete(&self, name: &str) -> Result<TargetState, ClusterError> {
        self.cluster.delete_controller(name).await?;
        info!("Deleted KluctlDeployment {}/{}", self.namespace(), name);
        Ok(TargetState::Absent)
    }

    /// Ask kluctl to deploy `name` now instead of on the next interval
    pub async fn force_deploy(&self, name: &str, credentials: &ClusterCredentials) -> Result<(), DeployTriggerError> {
        self.kluctl
            .gitops_deploy(name, self.namespace(), credentials.kubeconfig())
            .await
            .map_err(|source| {
                warn!("Forced deploy of {} failed: {}", name, source);
                DeployTriggerError {
                    name: name.to_string(),
                    source,
                }
            })?;
        info!("Deployed {}", name);
        Ok(())
    }

    /// Create `name` and force its first deploy.
    ///
    /// Only the create can fail; a deploy failure is reported through the
    /// returned state.
    pub async fn create_and_deploy(&self, name: &str, credentials: &ClusterCredentials) -> Result<TargetState, ClusterError> {
        self.create(name).await?;

        Ok(match self.force_deploy(name, credentials).await {
            Ok(()) => TargetState::Deployed,
            Err(e) => TargetState::DeployFailed {
                reason: e.source.to_string(),
            },
        })
    }
}
