use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Outcome of a shell command run inside the sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

pub trait CommandExecutor: Send + Sync {
    /// Run `command` through the sandbox shell and wait for it to finish.
    ///
    /// The command string is handed to the shell verbatim; callers are
    /// responsible for quoting any untrusted arguments.
    fn execute(&self, command: &str) -> Result<CommandResult>;
}
