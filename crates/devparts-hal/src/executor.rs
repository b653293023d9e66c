//! Privileged command execution
//!
//! Every channel that needs root goes through a [`CommandExecutor`]. The
//! production implementation wraps argv in `su -c` unless the process is
//! already root; tests swap in [`crate::mock::MockExecutor`].

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; -1 when the child was killed by a signal
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// First stdout line, if the command printed anything
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.first().map(String::as_str)
    }
}

/// Runs external commands to completion on the calling thread.
///
/// Implementations must block until the child exits. Launch failures are
/// reported as [`ExecutionError`]; a non-zero exit is a normal `Ok` result.
pub trait CommandExecutor: Send + Sync {
    fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecutionError>;
}

/// Executor that elevates through `su` when needed
#[derive(Debug, Clone)]
pub struct PrivilegedExecutor {
    su_binary: PathBuf,
    elevate: bool,
}

impl PrivilegedExecutor {
    /// Elevate through `su_binary` unless the effective uid is already root
    pub fn new(su_binary: impl Into<PathBuf>) -> Self {
        let elevate = !nix::unistd::Uid::effective().is_root();
        if !elevate {
            tracing::debug!("Running as root, commands will not be wrapped in su");
        }
        Self {
            su_binary: su_binary.into(),
            elevate,
        }
    }

    /// Run argv as-is with the current privileges
    pub fn direct() -> Self {
        Self {
            su_binary: PathBuf::from("su"),
            elevate: false,
        }
    }

    pub fn elevates(&self) -> bool {
        self.elevate
    }

    pub fn su_binary(&self) -> &Path {
        &self.su_binary
    }

    fn build_command(&self, argv: &[String]) -> Result<Command, ExecutionError> {
        let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyCommand)?;

        let command = if self.elevate {
            let mut cmd = Command::new(&self.su_binary);
            cmd.arg("-c").arg(shell_join(argv));
            cmd
        } else {
            let mut cmd = Command::new(program);
            cmd.args(args);
            cmd
        };

        Ok(command)
    }
}

impl Default for PrivilegedExecutor {
    fn default() -> Self {
        Self::new("su")
    }
}

impl CommandExecutor for PrivilegedExecutor {
    fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecutionError> {
        let mut command = self.build_command(argv)?;
        let command_line = shell_join(argv);

        tracing::debug!("Running `{}` (elevated: {})", command_line, self.elevate);

        let output = command.output().map_err(|e| ExecutionError::Launch {
            command: command_line.clone(),
            source: e,
        })?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_string)
                .collect(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        if !result.success() {
            tracing::debug!(
                "`{}` exited with {}: {}",
                command_line,
                result.exit_code,
                result.stderr
            );
        }

        Ok(result)
    }
}

/// Quote a single word for `sh`
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,%+@".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Join argv into a single `sh -c` command string
pub fn shell_join(argv: &[String]) -> String {
    argv.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the argv for a shell snippet, e.g. one using redirection
pub fn shell_argv(script: impl Into<String>) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.into()]
}
