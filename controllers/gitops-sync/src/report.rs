//! Per-name outcomes of a reconciliation pass.
//!
//! Each mutation yields an `ActionResult` whose `TargetState` is the explicit
//! end state of that name for this run:
//!
//! ```text
//! Absent  --create-->  PendingDeploy  --deploy ok-->    Deployed
//!                                     --deploy fail-->  DeployFailed
//! Present --delete-->  Absent
//! ```

use crate::reconciler::ReconcilePlan;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Create,
    Delete,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => f.write_str("create"),
            ActionKind::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum TargetState {
    /// Deleted (or never existed)
    Absent,
    /// Created, deploy not yet triggered
    PendingDeploy,
    /// Created and the forced deploy succeeded
    Deployed,
    /// Created but the forced deploy failed; terminal for this run
    DeployFailed { reason: String },
}

impl TargetState {
    pub fn is_deploy_failed(&self) -> bool {
        matches!(self, TargetState::DeployFailed { .. })
    }
}

/// A mutation that was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub name: String,
    pub action: ActionKind,
    #[serde(flatten)]
    pub state: TargetState,
}

/// A mutation that failed under the continue policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationFailure {
    pub name: String,
    pub action: ActionKind,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "detail")]
pub enum SkipReason {
    /// Name lacks the discriminator, so it could never be listed back
    MissingDiscriminator(String),
    /// Not a valid Kubernetes object name
    InvalidName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingDiscriminator(d) => write!(f, "name does not contain discriminator '{}'", d),
            SkipReason::InvalidName => f.write_str("not a valid Kubernetes object name"),
        }
    }
}

/// A declared target that was rejected before diffing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTarget {
    pub name: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub namespace: String,
    pub plan: ReconcilePlan,
    /// Applied mutations: deletions first, then creations
    pub results: Vec<ActionResult>,
    pub failures: Vec<MutationFailure>,
    pub skipped: Vec<SkippedTarget>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ReconcileReport {
    pub fn new(
        namespace: impl Into<String>,
        plan: ReconcilePlan,
        skipped: Vec<SkippedTarget>,
        dry_run: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            plan,
            results: Vec::new(),
            failures: Vec::new(),
            skipped,
            dry_run,
            started_at,
            finished_at: None,
        }
    }

    /// Names mutated this pass, in the order they were mutated
    pub fn modified(&self) -> Vec<String> {
        self.results.iter().map(|r| r.name.clone()).collect()
    }

    /// Created targets whose forced deploy failed
    pub fn deploy_failures(&self) -> impl Iterator<Item = &ActionResult> {
        self.results.iter().filter(|r| r.state.is_deploy_failed())
    }

    /// No mutation failures and no deploy failures
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.deploy_failures().next().is_none()
    }

    pub(crate) fn record(&mut self, name: &str, action: ActionKind, state: TargetState) {
        self.results.push(ActionResult {
            name: name.to_string(),
            action,
            state,
        });
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
