//! Test utilities for unit testing the reconciler
//!
//! Fixtures for project directories and configuration. Commands are recorded
//! with `kluctl_client::MockCommandRunner`.

use crate::config::{
    CredentialSource, DEFAULT_CONTEXT, DEFAULT_DISCRIMINATOR, DEFAULT_NAMESPACE, FailurePolicy, RunMode, SourceConfig,
    SyncConfig, TargetEnvironment,
};
use std::path::Path;
use tempfile::TempDir;

pub fn test_source() -> SourceConfig {
    SourceConfig {
        url: "https://git.example.com/platform/gitops.git".to_string(),
        git_ref: "main".to_string(),
        path: "app-deploy".to_string(),
    }
}

/// Non-production, local credentials, abort policy
pub fn test_config(project_dir: &Path) -> SyncConfig {
    SyncConfig {
        run_mode: RunMode::Local,
        environment: TargetEnvironment::NonProduction,
        namespace: DEFAULT_NAMESPACE.to_string(),
        discriminator: DEFAULT_DISCRIMINATOR.to_string(),
        project_dir: project_dir.to_path_buf(),
        source: test_source(),
        context: DEFAULT_CONTEXT.to_string(),
        credentials: CredentialSource::Local,
        kluctl_bin: "kluctl".to_string(),
        failure_policy: FailurePolicy::Abort,
        dry_run: false,
        report_file: None,
    }
}

/// Project directory whose `.kluctl.yaml` declares `targets`
pub fn project_with_targets(targets: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut yaml = String::from("discriminator: gitops-sync-test\n");
    if targets.is_empty() {
        yaml.push_str("targets: []\n");
    } else {
        yaml.push_str("targets:\n");
    }
    for target in targets {
        yaml.push_str(&format!("  - name: \"{}\"\n    context: default\n", target));
    }
    std::fs::write(dir.path().join(kluctl_client::PROJECT_FILE), yaml).unwrap();
    dir
}
