// Subprocess executor implementation
// reason: tokio for async process management, kill_on_drop so an abandoned
// test (timeout or Ctrl-C) does not outlive the run
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use arraybench_core::domain::CommandLine;
use arraybench_core::port::command_executor::{
    CommandExecutor, CommandOutput, ExecutionError, ExecutionStatus,
};
use arraybench_core::port::TimeProvider;

/// Subprocess executor
/// Spawns the program directly (no shell) in the benchmark working directory
pub struct SubprocessExecutor {
    time_provider: Arc<dyn TimeProvider>,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl SubprocessExecutor {
    /// Create a new subprocess executor running in the current directory
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(Arc::new(SystemTimeProvider::new()))
    ///     .with_working_dir("/home/me/arrays")
    ///     .with_timeout(Some(Duration::from_secs(600)));
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            working_dir: PathBuf::from("."),
            timeout: None,
        }
    }

    /// Directory the test sources live in; every command runs there.
    /// A relative directory is fixed against the current directory now, so
    /// `./prog` is not resolved twice once the child has changed directory.
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        self.working_dir = std::path::absolute(&working_dir).unwrap_or(working_dir);
        self
    }

    /// Limit on each single command (`None` waits forever)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Relative program paths with a separator (`./cmain`) are taken relative
    /// to the working directory; bare names are left to the PATH search.
    fn resolve_program(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            self.working_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Spawn child process and wait for output
    async fn spawn_and_wait(
        &self,
        command: &CommandLine,
    ) -> Result<std::process::Output, ExecutionError> {
        let child = Command::new(self.resolve_program(command.program()))
            .args(command.args())
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", command.program(), e)))?;

        match self.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(ExecutionError::IoError(e.to_string())),
                Err(_) => Err(ExecutionError::Timeout(limit.as_millis() as i64)),
            },
            None => child
                .wait_with_output()
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string())),
        }
    }

    /// Build command output from process output
    fn build_output(output: std::process::Output, duration_ms: i64) -> CommandOutput {
        let status = if output.status.success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };

        CommandOutput {
            status,
            exit_code: output.status.code(),
            duration_ms,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

#[async_trait]
impl CommandExecutor for SubprocessExecutor {
    async fn execute(&self, command: &CommandLine) -> Result<CommandOutput, ExecutionError> {
        let start = self.time_provider.monotonic_secs();

        debug!(
            command = %command,
            working_dir = %self.working_dir.display(),
            timeout_ms = ?self.timeout.map(|t| t.as_millis()),
            "Starting subprocess"
        );

        let output = self.spawn_and_wait(command).await?;

        let duration_ms = ((self.time_provider.monotonic_secs() - start) * 1000.0) as i64;
        let result = Self::build_output(output, duration_ms);

        info!(
            command = %command,
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Subprocess finished"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arraybench_core::port::time_provider::SystemTimeProvider;

    fn executor() -> SubprocessExecutor {
        SubprocessExecutor::new(Arc::new(SystemTimeProvider::new()))
    }

    fn cmd(line: &str) -> CommandLine {
        CommandLine::parse(line).unwrap()
    }

    #[tokio::test]
    async fn test_execute_success() {
        let result = executor().execute(&cmd("echo hello")).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), "hello");
        assert!(result.duration_ms >= 0);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failed_status() {
        let result = executor()
            .execute(&cmd("sh -c exit_7_is_not_a_command"))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(!result.success());
        assert!(!result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let executor = executor().with_timeout(Some(Duration::from_millis(100)));

        let result = executor.execute(&cmd("sleep 10")).await;

        assert!(matches!(result, Err(ExecutionError::Timeout(100))));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = executor()
            .execute(&cmd("definitely-not-a-real-program-xyz --version"))
            .await;

        match result {
            Err(ExecutionError::SpawnFailed(msg)) => {
                assert!(msg.starts_with("definitely-not-a-real-program-xyz"))
            }
            other => panic!("expected spawn failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let executor = executor().with_working_dir("/");

        let result = executor.execute(&cmd("pwd")).await.unwrap();

        assert_eq!(result.stdout.trim(), "/");
    }

    #[test]
    fn test_relative_working_dir_made_absolute() {
        let executor = executor().with_working_dir("bench");

        assert!(executor.working_dir().is_absolute());
        assert_eq!(
            executor.working_dir(),
            std::env::current_dir().unwrap().join("bench")
        );
        assert_eq!(
            executor.resolve_program("./cmain"),
            std::env::current_dir().unwrap().join("bench/./cmain")
        );
    }

    #[test]
    fn test_resolve_program() {
        let executor = executor().with_working_dir("/work/arrays");

        assert_eq!(
            executor.resolve_program("./cmain"),
            PathBuf::from("/work/arrays/./cmain")
        );
        assert_eq!(
            executor.resolve_program("target/release/array-kernel"),
            PathBuf::from("/work/arrays/target/release/array-kernel")
        );
        assert_eq!(executor.resolve_program("python3"), PathBuf::from("python3"));
        assert_eq!(executor.resolve_program("/bin/echo"), PathBuf::from("/bin/echo"));
    }
}
