// Build-and-time runner
// Builds one test program, times it at full and single repeat, cleans up.
use crate::domain::{CommandLine, TestDescriptor};
use crate::port::{CommandExecutor, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stage of a build-and-time cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Build command N (1-based)
    Build(usize),
    FullRun,
    SingleRun,
    Cleanup,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Build(n) => write!(f, "build {}", n),
            Step::FullRun => write!(f, "timed run"),
            Step::SingleRun => write!(f, "single-repeat run"),
            Step::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Why a test produced no timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub step: Step,
    pub command: String,
    /// "Error executing '<command>'"
    pub message: String,
    /// Error output of the failing step (stderr, or the spawn error)
    pub detail: String,
}

/// Result of one build-and-time cycle
#[derive(Debug, Clone, PartialEq)]
pub struct TimedRun {
    /// Repeat count used for the full run
    pub nrpt: u64,
    /// Overhead-corrected elapsed seconds for `nrpt` repeats
    pub outcome: Result<f64, RunFailure>,
}

/// Runs the build → time → cleanup cycle for a descriptor
pub struct BuildAndTimeRunner {
    executor: Arc<dyn CommandExecutor>,
    time_provider: Arc<dyn TimeProvider>,
}

impl BuildAndTimeRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            executor,
            time_provider,
        }
    }

    /// Build, time and clean up one test program.
    ///
    /// The program runs twice: once with `nrpt` repeats and once with a single
    /// repeat. The single-repeat time approximates startup and result-checking
    /// overhead, so
    ///
    /// ```text
    /// secs = (t_full - t_single) * nrpt / (nrpt - 1)
    /// ```
    ///
    /// The cleanup command always runs; its failure is reported only when
    /// every earlier step succeeded.
    pub async fn build_and_time(&self, descriptor: &TestDescriptor, nx: usize, ny: usize) -> TimedRun {
        let nrpt = descriptor.effective_repeats();
        let mut outcome = self.build_and_measure(descriptor, nrpt, nx, ny).await;

        if let Some(cleanup) = descriptor.cleanup_command() {
            if let Err(failure) = self.run_step(Step::Cleanup, &cleanup).await {
                if outcome.is_ok() {
                    outcome = Err(failure);
                } else {
                    debug!(command = %failure.command, "Cleanup failed after earlier failure (ignored)");
                }
            }
        }

        match &outcome {
            Ok(secs) => info!(test = %descriptor.label(), nrpt, secs, "Test timed"),
            Err(failure) => warn!(
                test = %descriptor.label(),
                step = %failure.step,
                command = %failure.command,
                "Test failed"
            ),
        }

        TimedRun { nrpt, outcome }
    }

    async fn build_and_measure(
        &self,
        descriptor: &TestDescriptor,
        nrpt: u64,
        nx: usize,
        ny: usize,
    ) -> Result<f64, RunFailure> {
        for (i, build) in descriptor.build_commands().iter().enumerate() {
            self.run_step(Step::Build(i + 1), build).await?;
        }

        let full = self.run_command(descriptor, Step::FullRun, nrpt, nx, ny)?;
        let full_secs = self.timed(Step::FullRun, &full).await?;

        let single = self.run_command(descriptor, Step::SingleRun, 1, nx, ny)?;
        let single_secs = self.timed(Step::SingleRun, &single).await?;

        debug!(
            test = %descriptor.label(),
            full_secs,
            single_secs,
            "Raw timings"
        );

        Ok(overhead_corrected(full_secs, single_secs, nrpt))
    }

    fn run_command(
        &self,
        descriptor: &TestDescriptor,
        step: Step,
        nrpt: u64,
        nx: usize,
        ny: usize,
    ) -> Result<CommandLine, RunFailure> {
        descriptor.run_command(nrpt, nx, ny).map_err(|e| RunFailure {
            step,
            command: descriptor.run.clone(),
            message: format!("Error executing '{}'", descriptor.run),
            detail: e.to_string(),
        })
    }

    /// Run a step and return its wall time in seconds
    async fn timed(&self, step: Step, command: &CommandLine) -> Result<f64, RunFailure> {
        let start = self.time_provider.monotonic_secs();
        self.run_step(step, command).await?;
        Ok(self.time_provider.monotonic_secs() - start)
    }

    async fn run_step(&self, step: Step, command: &CommandLine) -> Result<(), RunFailure> {
        debug!(step = %step, command = %command, "Executing");

        let failure = |detail: String| RunFailure {
            step,
            command: command.to_string(),
            message: format!("Error executing '{}'", command),
            detail,
        };

        match self.executor.execute(command).await {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(failure(output.stderr)),
            Err(e) => Err(failure(e.to_string())),
        }
    }
}

/// Remove the single-repeat overhead and rescale to `nrpt` repeats
pub fn overhead_corrected(full_secs: f64, single_secs: f64, nrpt: u64) -> f64 {
    let nrpt = nrpt as f64;
    (full_secs - single_secs) * nrpt / (nrpt - 1.0)
}
