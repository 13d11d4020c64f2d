//! gitops-sync
//!
//! One-shot reconciler that keeps the `KluctlDeployment` objects in a namespace
//! in step with the targets declared in a kluctl project:
//! - targets with no controller get one, followed by an immediate deploy
//! - controllers whose target disappeared are deleted
//!
//! Modified names are printed to stdout, one per line; logs go to stderr.

mod config;
mod credentials;
mod error;
mod mutator;
mod reconciler;
#[cfg(test)]
mod reconciler_test;
mod report;
mod targets;
#[cfg(test)]
mod test_utils;

use anyhow::{Context, bail};
use cluster_client::KubeClusterClient;
use config::SyncConfig;
use error::CredentialError;
use kluctl_client::KluctlCli;
use reconciler::Reconciler;
use report::ReconcileReport;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // kube's rustls backend needs a process-wide crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    info!("Starting gitops-sync");

    let config = SyncConfig::from_env()?;
    config.log_summary();

    // Held until the end of main so a fetched kubeconfig outlives the pass
    let credentials = credentials::acquire(&config.credentials).await?;
    if credentials.is_temporary() {
        info!("Using fetched kubeconfig; it is removed when the run ends");
    }
    let cluster = KubeClusterClient::from_kubeconfig(credentials.kubeconfig(), &config.namespace)
        .await
        .map_err(CredentialError::from)?;

    let kluctl = KluctlCli::new(&config.kluctl_bin);
    let report_file = config.report_file.clone();
    let reconciler = Reconciler::new(config, Arc::new(cluster), kluctl);

    let outcome = reconciler.run(&credentials).await;

    // An aborted pass still emits what it did before stopping
    let emitted = match &outcome {
        Ok(report) => Some(report),
        Err(e) => e.partial_report(),
    };
    if let Some(report) = emitted {
        emit_report(report, report_file.as_deref())?;
    }
    let report = outcome?;

    if report.is_clean() {
        info!("Reconciliation complete");
    }

    if !report.failures.is_empty() {
        let names: Vec<&str> = report.failures.iter().map(|f| f.name.as_str()).collect();
        bail!("{} KluctlDeployment changes failed: {:?}", names.len(), names);
    }

    Ok(())
}

/// Print modified names to stdout, log the outcome, and write the JSON report
fn emit_report(report: &ReconcileReport, report_file: Option<&Path>) -> anyhow::Result<()> {
    for name in report.modified() {
        println!("{}", name);
    }
    log_report(report);

    if let Some(path) = report_file {
        write_report(report, path)?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn write_report(report: &ReconcileReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write report to {}", path.display()))
}

fn log_report(report: &ReconcileReport) {
    for result in &report.results {
        info!("{} {}: {:?}", result.action, result.name, result.state);
    }
    for skipped in &report.skipped {
        warn!("Skipped {}: {}", skipped.name, skipped.reason);
    }
    for failed in report.deploy_failures() {
        // The controller exists; kluctl retries on its own interval
        warn!("Initial deploy of {} did not succeed", failed.name);
    }
    for failure in &report.failures {
        warn!("Failed to {} {}: {}", failure.action, failure.name, failure.error);
    }
}
