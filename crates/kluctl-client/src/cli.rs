//! kluctl CLI wrapper
//!
//! Only `kluctl gitops deploy` is needed: it asks the kluctl controller to
//! deploy a KluctlDeployment now instead of waiting for its interval.

use crate::error::KluctlError;
use crate::process::{CommandRunner, CommandSpec, TokioCommandRunner};
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default executable name, resolved through `PATH`
pub const DEFAULT_KLUCTL_BIN: &str = "kluctl";

/// kluctl CLI
#[derive(Debug, Clone)]
pub struct KluctlCli<R: CommandRunner = TokioCommandRunner> {
    binary: OsString,
    runner: R,
}

impl KluctlCli<TokioCommandRunner> {
    /// Create a CLI wrapper that spawns real processes
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
            runner: TokioCommandRunner,
        }
    }
}

impl<R: CommandRunner> KluctlCli<R> {
    /// Create a CLI wrapper with a custom command runner
    pub fn with_runner(binary: impl Into<OsString>, runner: R) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    /// Command line for `kluctl gitops deploy` against one KluctlDeployment
    ///
    /// `name` becomes exactly one argv element whatever it contains.
    pub fn gitops_deploy_command(
        &self,
        name: &str,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> CommandSpec {
        let mut command = CommandSpec::new(self.binary.clone())
            .arg("gitops")
            .arg("deploy")
            .arg("-y")
            .arg("--name")
            .arg(name)
            .arg("--namespace")
            .arg(namespace);

        if let Some(path) = kubeconfig {
            command = command.env("KUBECONFIG", path);
        }
        command
    }

    /// Trigger an immediate deploy and wait for kluctl to finish
    pub async fn gitops_deploy(
        &self,
        name: &str,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), KluctlError> {
        let command = self.gitops_deploy_command(name, namespace, kubeconfig);
        info!("Triggering kluctl deploy for {}/{}", namespace, name);

        let output = self
            .runner
            .run(&command)
            .await
            .map_err(|source| KluctlError::Spawn {
                program: command.program_name(),
                source,
            })?;

        if output.success {
            debug!("kluctl deploy output for {}: {}", name, output.stdout.trim());
            Ok(())
        } else {
            warn!("kluctl deploy for {} exited with {:?}", name, output.code);
            Err(KluctlError::DeployFailed {
                name: name.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}
