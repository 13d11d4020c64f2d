//! Reconciliation pass.
//!
//! One pass reads the declared targets, lists the controllers that exist, and
//! applies the set difference: deletions first, then creations, each creation
//! followed by a forced deploy of the same name.

use crate::config::{FailurePolicy, SyncConfig};
use crate::credentials::ClusterCredentials;
use crate::error::{ConfigError, SyncError};
use crate::mutator::ControllerMutator;
use crate::report::{ActionKind, MutationFailure, ReconcileReport};
use crate::targets::{filter_actual, normalize_desired};
use chrono::Utc;
use cluster_client::{ClusterClientTrait, ClusterError};
use kluctl_client::{CommandRunner, KluctlCli, TokioCommandRunner};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Actions needed to converge actual controllers onto desired targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    /// Present but no longer declared, in listing order
    pub to_delete: Vec<String>,
    /// Declared but not present, in declaration order
    pub to_create: Vec<String>,
}

impl ReconcilePlan {
    pub fn compute(actual: &[String], desired: &[String]) -> Self {
        let actual_set: HashSet<&str> = actual.iter().map(String::as_str).collect();
        let desired_set: HashSet<&str> = desired.iter().map(String::as_str).collect();

        Self {
            to_delete: actual
                .iter()
                .filter(|name| !desired_set.contains(name.as_str()))
                .cloned()
                .collect(),
            to_create: desired
                .iter()
                .filter(|name| !actual_set.contains(name.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }

    /// Names this plan would modify, deletions first
    pub fn modified_names(&self) -> Vec<String> {
        self.to_delete.iter().chain(&self.to_create).cloned().collect()
    }
}

/// Runs reconciliation passes for one namespace
pub struct Reconciler<R: CommandRunner = TokioCommandRunner> {
    config: SyncConfig,
    cluster: Arc<dyn ClusterClientTrait>,
    mutator: ControllerMutator<R>,
}

impl<R: CommandRunner> std::fmt::Debug for Reconciler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("mutator", &self.mutator)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> Reconciler<R> {
    pub fn new(config: SyncConfig, cluster: Arc<dyn ClusterClientTrait>, kluctl: KluctlCli<R>) -> Self {
        let mutator = ControllerMutator::new(
            cluster.clone(),
            kluctl,
            config.source.clone(),
            config.context.clone(),
        );
        Self {
            config,
            cluster,
            mutator,
        }
    }

    /// Run one reconciliation pass
    ///
    /// Target and cluster reads happen before any mutation, so a `Config` or
    /// `ClusterRead` error leaves the cluster untouched.
    pub async fn run(&self, credentials: &ClusterCredentials) -> Result<ReconcileReport, SyncError> {
        let started_at = Utc::now();
        let namespace = self.cluster.namespace().to_string();
        let discriminator = self.config.discriminator.as_str();

        let project_file = kluctl_client::project_file(&self.config.project_dir);
        let declared = kluctl_client::read_targets(&project_file).map_err(ConfigError::from)?;

        let desired = normalize_desired(
            declared.iter().map(|t| t.name.as_str()),
            self.config.environment,
            discriminator,
        );
        for skipped in &desired.skipped {
            warn!("Skipping target '{}': {}", skipped.name, skipped.reason);
        }

        let listed = self
            .cluster
            .list_controller_names()
            .await
            .map_err(|source| SyncError::ClusterRead {
                namespace: namespace.clone(),
                source,
            })?;
        let actual = filter_actual(listed, discriminator);

        info!("Desired targets: {:?}", desired.names);
        info!("Existing controllers: {:?}", actual);

        let plan = ReconcilePlan::compute(&actual, &desired.names);
        if plan.is_empty() {
            info!("KluctlDeployments in {} are up to date", namespace);
        } else {
            info!("Will delete: {:?}", plan.to_delete);
            info!("Will create: {:?}", plan.to_create);
        }

        let mut report = ReconcileReport::new(
            &namespace,
            plan.clone(),
            desired.skipped,
            self.config.dry_run,
            started_at,
        );
        if self.config.dry_run {
            info!("Dry run: skipping {} changes", plan.modified_names().len());
            report.finish();
            return Ok(report);
        }

        for name in &plan.to_delete {
            match self.mutator.delete(name).await {
                Ok(state) => report.record(name, ActionKind::Delete, state),
                Err(e) => self.handle_failure(&mut report, name, ActionKind::Delete, e)?,
            }
        }

        for name in &plan.to_create {
            match self.mutator.create_and_deploy(name, credentials).await {
                Ok(state) => report.record(name, ActionKind::Create, state),
                Err(e) => self.handle_failure(&mut report, name, ActionKind::Create, e)?,
            }
        }

        report.finish();
        info!(
            "Reconciliation of {} finished: {} modified, {} failed",
            namespace,
            report.results.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn handle_failure(
        &self,
        report: &mut ReconcileReport,
        name: &str,
        action: ActionKind,
        source: ClusterError,
    ) -> Result<(), SyncError> {
        error!("Failed to {} KluctlDeployment {}: {}", action, name, source);
        report.failures.push(MutationFailure {
            name: name.to_string(),
            action,
            error: source.to_string(),
        });
        match self.config.failure_policy {
            FailurePolicy::Abort => {
                report.finish();
                Err(SyncError::Mutation {
                    name: name.to_string(),
                    action,
                    report: Box::new(report.clone()),
                    source,
                })
            }
            FailurePolicy::Continue => Ok(()),
        }
    }
}
