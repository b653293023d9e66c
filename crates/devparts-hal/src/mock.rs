//! Scripted command executor for testing without real hardware
//!
//! Responses are keyed by program name (argv[0]). Programs without a
//! scripted response behave like a missing binary and fail to launch.
//!
//! ```
//! use devparts_hal::mock::MockExecutor;
//! use devparts_hal::CommandExecutor;
//!
//! let mock = MockExecutor::new();
//! mock.respond("ts_srv_set", 0, "Finger mode");
//!
//! let out = mock.run(&["ts_srv_set".to_string(), "G".to_string()]).unwrap();
//! assert_eq!(out.first_line(), Some("Finger mode"));
//! assert_eq!(mock.calls().len(), 1);
//! ```

use crate::executor::{CommandExecutor, CommandOutput, ExecutionError};
use std::collections::HashMap;
use std::sync::Mutex;

/// Executor returning canned output and recording every argv it receives
#[derive(Debug, Default)]
pub struct MockExecutor {
    responses: Mutex<HashMap<String, CommandOutput>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result of every later invocation of `program`
    pub fn respond(&self, program: &str, exit_code: i32, stdout: &str) {
        let output = CommandOutput {
            exit_code,
            stdout: stdout.lines().map(str::to_string).collect(),
            stderr: String::new(),
        };
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(program.to_string(), output);
        }
    }

    /// Make `program` fail to launch again
    pub fn forget(&self, program: &str) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.remove(program);
        }
    }

    /// Every argv seen so far, oldest first
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

impl CommandExecutor for MockExecutor {
    fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecutionError> {
        let program = argv.first().ok_or(ExecutionError::EmptyCommand)?;

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(argv.to_vec());
        }
        tracing::debug!("[MOCK] {}", argv.join(" "));

        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|r| r.get(program.as_str()).cloned());

        response.ok_or_else(|| ExecutionError::Launch {
            command: program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no scripted response"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscripted_program_fails_to_launch() {
        let mock = MockExecutor::new();
        let err = mock.run(&["cat".to_string()]).unwrap_err();
        assert!(matches!(err, ExecutionError::Launch { .. }));
        assert_eq!(mock.calls(), vec![vec!["cat".to_string()]]);
    }

    #[test]
    fn test_respond_and_forget() {
        let mock = MockExecutor::new();
        mock.respond("helper", 2, "a\nb");

        let out = mock.run(&["helper".to_string()]).unwrap();
        assert_eq!(out.exit_code, 2);
        assert_eq!(out.stdout, vec!["a", "b"]);

        mock.forget("helper");
        assert!(mock.run(&["helper".to_string()]).is_err());

        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }
}
