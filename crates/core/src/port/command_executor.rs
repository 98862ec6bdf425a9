// Command Executor Port
// Abstraction for running one external command to completion

use crate::domain::CommandLine;
use async_trait::async_trait;
use thiserror::Error;

/// Result of running a command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExecutionStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors (the command could not be run to completion)
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(i64),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Command Executor trait
///
/// Implementations:
/// - SubprocessExecutor: spawns the program directly, without a shell
/// - ScriptedExecutor: canned responses for tests
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and wait for it to finish
    ///
    /// A non-zero exit is reported as `ExecutionStatus::Failed`, not as an error.
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    /// - ExecutionError::Timeout if the command exceeds the configured limit
    async fn execute(&self, command: &CommandLine) -> Result<CommandOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use std::sync::{Arc, Mutex};

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit zero after `secs` of simulated time
        Succeed {
            secs: f64,
            stdout: String,
            stderr: String,
        },
        /// Exit non-zero after `secs` of simulated time
        Fail { secs: f64, stderr: String },
        /// Program could not be started
        SpawnError(String),
        /// Timeout after N ms
        Timeout(i64),
    }

    impl MockBehavior {
        pub fn succeed(secs: f64) -> Self {
            MockBehavior::Succeed {
                secs,
                stdout: String::new(),
                stderr: String::new(),
            }
        }

        pub fn output(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
            MockBehavior::Succeed {
                secs: 0.0,
                stdout: stdout.into(),
                stderr: stderr.into(),
            }
        }

        pub fn fail(stderr: impl Into<String>) -> Self {
            MockBehavior::Fail {
                secs: 0.0,
                stderr: stderr.into(),
            }
        }
    }

    /// Mock Command Executor for testing
    ///
    /// A rule matches when the command equals its pattern or starts with the
    /// pattern followed by a space. The first matching rule wins; unmatched
    /// commands succeed instantly.
    pub struct ScriptedExecutor {
        clock: Option<Arc<ManualTimeProvider>>,
        rules: Vec<(String, MockBehavior)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self {
                clock: None,
                rules: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Advance this clock by each command's simulated duration
        pub fn with_clock(mut self, clock: Arc<ManualTimeProvider>) -> Self {
            self.clock = Some(clock);
            self
        }

        pub fn on(mut self, pattern: impl Into<String>, behavior: MockBehavior) -> Self {
            self.rules.push((pattern.into(), behavior));
            self
        }

        /// Every command executed so far, in order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn behavior_for(&self, command: &str) -> MockBehavior {
            self.rules
                .iter()
                .find(|(pattern, _)| {
                    command == pattern
                        || command
                            .strip_prefix(pattern.as_str())
                            .is_some_and(|rest| rest.starts_with(' '))
                })
                .map(|(_, behavior)| behavior.clone())
                .unwrap_or_else(|| MockBehavior::succeed(0.0))
        }

        fn tick(&self, secs: f64) {
            if let Some(clock) = &self.clock {
                clock.advance(secs);
            }
        }
    }

    impl Default for ScriptedExecutor {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn execute(&self, command: &CommandLine) -> Result<CommandOutput, ExecutionError> {
            let rendered = command.to_string();
            self.calls.lock().unwrap().push(rendered.clone());

            match self.behavior_for(&rendered) {
                MockBehavior::Succeed {
                    secs,
                    stdout,
                    stderr,
                } => {
                    self.tick(secs);
                    Ok(CommandOutput {
                        status: ExecutionStatus::Success,
                        exit_code: Some(0),
                        duration_ms: (secs * 1000.0) as i64,
                        stdout,
                        stderr,
                    })
                }
                MockBehavior::Fail { secs, stderr } => {
                    self.tick(secs);
                    Ok(CommandOutput {
                        status: ExecutionStatus::Failed,
                        exit_code: Some(1),
                        duration_ms: (secs * 1000.0) as i64,
                        stdout: String::new(),
                        stderr,
                    })
                }
                MockBehavior::SpawnError(msg) => Err(ExecutionError::SpawnFailed(msg)),
                MockBehavior::Timeout(ms) => Err(ExecutionError::Timeout(ms)),
            }
        }
    }
}
