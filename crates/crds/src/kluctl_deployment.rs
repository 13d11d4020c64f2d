//! KluctlDeployment CRD
//!
//! Declares one kluctl target that the kluctl controller deploys on an interval
//! from a git source.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the kluctl controller's resources
pub const KLUCTL_API_GROUP: &str = "gitops.kluctl.io";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "gitops.kluctl.io",
    version = "v1beta1",
    kind = "KluctlDeployment",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KluctlDeploymentSpec {
    /// Reconcile cadence in Go duration format (e.g. "5m")
    pub interval: String,

    /// Where the kluctl project lives
    pub source: ProjectSource,

    /// Target from `.kluctl.yaml` to deploy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Kubeconfig context used by the kluctl controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Remove objects that disappeared from the project
    #[serde(default)]
    pub prune: bool,

    /// Delete deployed objects when this resource is deleted
    #[serde(default)]
    pub delete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSource {
    /// Git repository holding the kluctl project
    pub git: GitProjectSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitProjectSource {
    /// Repository URL (no embedded credentials)
    pub url: String,

    /// Branch or tag to check out
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<GitRef>,

    /// Sub-directory of the repository containing `.kluctl.yaml`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl GitRef {
    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            branch: Some(name.into()),
            tag: None,
        }
    }
}
