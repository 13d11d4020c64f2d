//! Cluster credentials.
//!
//! Either the local kubeconfig kube would pick up anyway, or a k3s kubeconfig
//! copied off a cluster node with `scp`. A fetched kubeconfig lives in a
//! private temporary directory owned by `ClusterCredentials`; dropping the
//! value removes it, whichever way the run ends.

use crate::config::CredentialSource;
use crate::error::CredentialError;
use kluctl_client::{CommandRunner, CommandSpec, TokioCommandRunner};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const FETCHED_KUBECONFIG: &str = "kubeconfig.yaml";
const LOOPBACK_HOSTS: [&str; 3] = ["127.0.0.1", "localhost", "[::1]"];

/// Resolved cluster access for one run
#[derive(Debug)]
pub struct ClusterCredentials {
    kubeconfig: Option<PathBuf>,
    // Removes the fetched kubeconfig on drop
    scratch: Option<TempDir>,
}

impl ClusterCredentials {
    /// Defer to kube's default kubeconfig resolution
    pub fn local() -> Self {
        Self {
            kubeconfig: None,
            scratch: None,
        }
    }

    /// Explicit kubeconfig path, `None` for local resolution
    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }

    /// Whether the kubeconfig is a fetched temporary copy
    pub fn is_temporary(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Acquire credentials for the configured source
pub async fn acquire(source: &CredentialSource) -> Result<ClusterCredentials, CredentialError> {
    match source {
        CredentialSource::Local => {
            info!("Using local kubeconfig");
            Ok(ClusterCredentials::local())
        }
        CredentialSource::Remote {
            host,
            key_file,
            remote_path,
        } => {
            RemoteCredentialFetcher::new(host.clone(), key_file.clone(), remote_path.clone())
                .fetch_remote_credentials()
                .await
        }
    }
}

/// Copies a kubeconfig off a remote host over SSH
#[derive(Debug, Clone)]
pub struct RemoteCredentialFetcher<R: CommandRunner = TokioCommandRunner> {
    host: String,
    key_file: Option<PathBuf>,
    remote_path: String,
    runner: R,
}

impl RemoteCredentialFetcher<TokioCommandRunner> {
    pub fn new(host: String, key_file: Option<PathBuf>, remote_path: String) -> Self {
        Self::with_runner(host, key_file, remote_path, TokioCommandRunner)
    }
}

impl<R: CommandRunner> RemoteCredentialFetcher<R> {
    pub fn with_runner(host: String, key_file: Option<PathBuf>, remote_path: String, runner: R) -> Self {
        Self {
            host,
            key_file,
            remote_path,
            runner,
        }
    }

    /// `scp` invocation copying the remote kubeconfig to `destination`
    pub fn scp_command(&self, destination: &Path) -> CommandSpec {
        let mut command = CommandSpec::new("scp")
            .arg("-q")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("StrictHostKeyChecking=accept-new")
            .arg("-o")
            .arg("ConnectTimeout=30");
        if let Some(key) = &self.key_file {
            command = command.arg("-i").arg(key);
        }
        command
            .arg(format!("{}:{}", self.host, self.remote_path))
            .arg(destination)
    }

    pub async fn fetch_remote_credentials(&self) -> Result<ClusterCredentials, CredentialError> {
        if let Some(key) = &self.key_file {
            if !key.is_file() {
                return Err(CredentialError::Authentication {
                    host: self.host.clone(),
                    detail: format!("key file {} does not exist", key.display()),
                });
            }
        }

        let scratch = tempfile::Builder::new().prefix("gitops-sync-").tempdir()?;
        let destination = scratch.path().join(FETCHED_KUBECONFIG);

        info!("Fetching kubeconfig from {}:{}", self.host, self.remote_path);
        let output = self
            .runner
            .run(&self.scp_command(&destination))
            .await
            .map_err(|e| CredentialError::Transport {
                host: self.host.clone(),
                detail: format!("failed to execute scp: {}", e),
            })?;

        if !output.success {
            return Err(classify_scp_failure(&self.host, &self.remote_path, &output.stderr));
        }

        let contents = std::fs::read_to_string(&destination)?;
        let rewritten = rewrite_loopback_servers(&contents, ssh_hostname(&self.host)).map_err(|detail| {
            CredentialError::InvalidKubeconfig {
                host: self.host.clone(),
                detail,
            }
        })?;
        std::fs::write(&destination, rewritten)?;
        restrict_permissions(&destination)?;

        debug!("Kubeconfig stored at {}", destination.display());
        Ok(ClusterCredentials {
            kubeconfig: Some(destination),
            scratch: Some(scratch),
        })
    }
}

/// Map scp's stderr onto the credential error taxonomy
pub fn classify_scp_failure(host: &str, remote_path: &str, stderr: &str) -> CredentialError {
    let detail = stderr.trim().to_string();
    let lower = detail.to_lowercase();

    let auth_markers = [
        "permission denied (publickey",
        "permission denied, please try again",
        "too many authentication failures",
        "host key verification failed",
        "load key",
        "invalid format",
    ];
    if auth_markers.iter().any(|m| lower.contains(m)) {
        return CredentialError::Authentication {
            host: host.to_string(),
            detail,
        };
    }

    if lower.contains("permission denied") || lower.contains("no such file or directory") {
        return CredentialError::Permission {
            host: host.to_string(),
            path: remote_path.to_string(),
            detail,
        };
    }

    CredentialError::Transport {
        host: host.to_string(),
        detail,
    }
}

/// Hostname part of an SSH destination (`user@host` -> `host`)
pub fn ssh_hostname(destination: &str) -> &str {
    destination
        .rsplit_once('@')
        .map_or(destination, |(_, host)| host)
}

/// Point loopback API server URLs at `host`.
///
/// k3s writes `https://127.0.0.1:6443` into its kubeconfig, which only works
/// on the node itself.
pub fn rewrite_loopback_servers(kubeconfig: &str, host: &str) -> Result<String, String> {
    let mut doc: serde_yaml::Value =
        serde_yaml::from_str(kubeconfig).map_err(|e| format!("not valid YAML: {}", e))?;

    let clusters = doc
        .get_mut("clusters")
        .and_then(|c| c.as_sequence_mut())
        .ok_or_else(|| "no clusters defined".to_string())?;

    for entry in clusters.iter_mut() {
        let Some(server) = entry
            .get_mut("cluster")
            .and_then(|c| c.get_mut("server"))
        else {
            continue;
        };
        if let Some(rewritten) = server.as_str().and_then(|s| replace_loopback_host(s, host)) {
            debug!("Rewriting API server {:?} to {}", server.as_str(), rewritten);
            *server = serde_yaml::Value::String(rewritten);
        }
    }

    serde_yaml::to_string(&doc).map_err(|e| format!("failed to serialize: {}", e))
}

fn replace_loopback_host(server: &str, host: &str) -> Option<String> {
    let (scheme, rest) = server.split_once("://")?;
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let loopback = LOOPBACK_HOSTS
        .iter()
        .find(|lb| authority == **lb || authority.starts_with(&format!("{}:", lb)))?;
    let port = &authority[loopback.len()..];
    Some(format!("{}://{}{}{}", scheme, host, port, path))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
