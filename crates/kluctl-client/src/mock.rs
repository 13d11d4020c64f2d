//! Mock command runner for unit testing
//!
//! Records every command instead of spawning it and replies with a canned
//! result. Clones share the recording, so a test can keep a handle while the
//! code under test owns another.

use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use std::sync::{Arc, Mutex};

type Effect = Arc<dyn Fn(&CommandSpec) + Send + Sync>;

#[derive(Debug, Clone)]
enum Reply {
    Exit { code: i32, stderr: String },
    SpawnError(std::io::ErrorKind),
}

/// In-memory `CommandRunner`
#[derive(Clone)]
pub struct MockCommandRunner {
    commands: Arc<Mutex<Vec<CommandSpec>>>,
    reply: Reply,
    effect: Option<Effect>,
}

impl std::fmt::Debug for MockCommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCommandRunner")
            .field("reply", &self.reply)
            .field("commands", &self.commands())
            .finish_non_exhaustive()
    }
}

impl MockCommandRunner {
    /// Every command exits 0
    pub fn succeeding() -> Self {
        Self::failing(0, "")
    }

    /// Every command exits with `code` and writes `stderr`
    pub fn failing(code: i32, stderr: &str) -> Self {
        Self::with_reply(Reply::Exit {
            code,
            stderr: stderr.to_string(),
        })
    }

    /// Every command fails to start with `kind`
    pub fn spawn_error(kind: std::io::ErrorKind) -> Self {
        Self::with_reply(Reply::SpawnError(kind))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            commands: Arc::new(Mutex::new(Vec::new())),
            reply,
            effect: None,
        }
    }

    /// Run `effect` for each command before replying (e.g. to create output files)
    pub fn with_effect(mut self, effect: impl Fn(&CommandSpec) + Send + Sync + 'static) -> Self {
        self.effect = Some(Arc::new(effect));
        self
    }

    /// All commands run so far
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }

    /// Values passed to `--name`, in invocation order
    pub fn deployed_names(&self) -> Vec<String> {
        self.commands()
            .iter()
            .filter_map(|c| {
                let pos = c.args.iter().position(|a| a == "--name")?;
                c.args.get(pos + 1).map(|a| a.to_string_lossy().into_owned())
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, command: &CommandSpec) -> std::io::Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.clone());
        if let Some(effect) = &self.effect {
            effect(command);
        }
        match &self.reply {
            Reply::Exit { code, stderr } => Ok(CommandOutput {
                success: *code == 0,
                code: Some(*code),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            Reply::SpawnError(kind) => Err(std::io::Error::from(*kind)),
        }
    }
}
