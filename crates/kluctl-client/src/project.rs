//! kluctl project file
//!
//! Reads the `targets` list out of `.kluctl.yaml`. Everything else in the file
//! (args, discriminator templates, git includes) is kluctl's business and is
//! ignored here.

use crate::error::KluctlError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of a kluctl project definition
pub const PROJECT_FILE: &str = ".kluctl.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct KluctlProject {
    /// Required: a project without the key is treated as malformed rather than
    /// as "no targets", which would delete every controller.
    pub targets: Vec<TargetDeclaration>,
}

/// One entry under `targets:`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TargetDeclaration {
    pub name: String,
}

/// Path of the project file inside `project_dir`
pub fn project_file(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_FILE)
}

/// Parse target declarations from a project file.
pub fn read_targets(config_path: &Path) -> Result<Vec<TargetDeclaration>, KluctlError> {
    if !config_path.is_file() {
        return Err(KluctlError::ConfigNotFound(config_path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(config_path).map_err(|source| KluctlError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;

    let project = parse_project(&contents).map_err(|source| KluctlError::ConfigParse {
        path: config_path.to_path_buf(),
        source,
    })?;

    debug!("Read {} targets from {}", project.targets.len(), config_path.display());
    Ok(project.targets)
}

fn parse_project(contents: &str) -> Result<KluctlProject, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}
