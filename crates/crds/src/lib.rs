//! gitops-sync CRD Definitions
//!
//! Typed view of the kluctl controller's `KluctlDeployment` custom resource.
//! Only the fields gitops-sync writes are modeled; the kluctl controller owns
//! the authoritative schema.

pub mod kluctl_deployment;

pub use kluctl_deployment::*;
