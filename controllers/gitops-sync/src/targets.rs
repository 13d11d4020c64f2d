//! Target name helpers.
//!
//! Turns the raw `.kluctl.yaml` target list into the desired name set for one
//! environment, and the raw cluster listing into the actual name set.

use crate::config::TargetEnvironment;
use crate::report::{SkipReason, SkippedTarget};
use std::collections::HashSet;

/// Substring that puts a target in the production partition
pub const PRODUCTION_MARKER: &str = "prod";

/// Longest valid Kubernetes object name (RFC 1123 subdomain)
const MAX_NAME_LEN: usize = 253;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredTargets {
    /// Normalized names, declaration order, no duplicates
    pub names: Vec<String>,
    pub skipped: Vec<SkippedTarget>,
}

pub fn in_partition(name: &str, environment: TargetEnvironment) -> bool {
    let production = name.contains(PRODUCTION_MARKER);
    match environment {
        TargetEnvironment::Production => production,
        TargetEnvironment::NonProduction => !production,
    }
}

pub fn has_discriminator(name: &str, discriminator: &str) -> bool {
    name.contains(discriminator)
}

/// RFC 1123 subdomain check used by the API server for object names
pub fn is_valid_resource_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() <= MAX_NAME_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-' || *b == b'.')
}

/// Normalize declared target names into the desired set
pub fn normalize_desired<I, S>(declared: I, environment: TargetEnvironment, discriminator: &str) -> DesiredTargets
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut desired = DesiredTargets::default();

    for raw in declared {
        let name = raw.as_ref().trim();
        if name.is_empty() || !in_partition(name, environment) || !seen.insert(name.to_string()) {
            continue;
        }

        let rejection = if !has_discriminator(name, discriminator) {
            Some(SkipReason::MissingDiscriminator(discriminator.to_string()))
        } else if !is_valid_resource_name(name) {
            Some(SkipReason::InvalidName)
        } else {
            None
        };

        match rejection {
            Some(reason) => desired.skipped.push(SkippedTarget {
                name: name.to_string(),
                reason,
            }),
            None => desired.names.push(name.to_string()),
        }
    }
    desired
}

/// Restrict a cluster listing to this system's controllers
pub fn filter_actual(listed: Vec<String>, discriminator: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    listed
        .into_iter()
        .filter(|name| has_discriminator(name, discriminator))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
