//! kluctl client
//!
//! Two narrow surfaces over the kluctl tool:
//! - `project`: reads target declarations from a project's `.kluctl.yaml`
//! - `cli`: runs `kluctl gitops deploy` for one KluctlDeployment
//!
//! Subprocesses go through the `CommandRunner` trait in `process`, which never
//! involves a shell.

pub mod cli;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod process;
pub mod project;

pub use cli::*;
pub use error::*;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockCommandRunner;
pub use process::*;
pub use project::*;
