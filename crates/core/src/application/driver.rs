// Benchmark Driver - runs the registry (optionally several passes) and
// aggregates the best time per (language, compiler) cell

use crate::application::constants::{DEFAULT_BUSY_CPU_THRESHOLD, ITERATIONS_PER_UNIT};
use crate::application::runner::{BuildAndTimeRunner, RunFailure, TimedRun};
use crate::application::shutdown::ShutdownToken;
use crate::domain::{Fastest, Registry, ResultsMatrix};
use crate::error::Result;
use crate::port::{CommandExecutor, HostInfo, HostProbe, IdProvider, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// How much work a run does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    /// Passes through the full registry; the best time per cell wins
    pub passes: u32,
    /// Columns
    pub nx: usize,
    /// Rows
    pub ny: usize,
}

impl RunPlan {
    fn effective_passes(&self) -> u32 {
        self.passes.max(1)
    }
}

/// What happened to one test in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub pass: u32,
    pub lang_tech: String,
    pub comp_opt: String,
    pub nrpt: u64,
    pub result: OutcomeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeKind {
    Timed {
        /// Overhead-corrected seconds for `nrpt` repeats
        elapsed_secs: f64,
        /// Seconds per 1000 repeats
        kiter_secs: f64,
    },
    Failed(RunFailure),
}

/// A (language, compiler) pair in registry order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub lang_tech: String,
    pub comp_opt: String,
}

/// Everything a finished (or interrupted) run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub run_id: String,
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
    #[serde(flatten)]
    pub plan: RunPlan,
    pub host: Option<HostInfo>,
    /// Registry entries in run order, one per descriptor
    pub tests: Vec<CellRef>,
    pub outcomes: Vec<TestOutcome>,
    pub matrix: ResultsMatrix,
    pub fastest: Option<Fastest>,
    pub interrupted: bool,
}

impl BenchmarkReport {
    /// Baseline all relative times are divided by (1.0 when nothing succeeded)
    pub fn bench_kiter_secs(&self) -> f64 {
        self.fastest.as_ref().map_or(1.0, |f| f.kiter_secs)
    }
}

/// Receives progress as the run goes
pub trait ProgressListener: Send + Sync {
    fn pass_started(&self, _pass: u32, _plan: &RunPlan) {}
    fn test_finished(&self, _outcome: &TestOutcome) {}
}

/// Listener that ignores everything
pub struct NoopListener;

impl ProgressListener for NoopListener {}

/// Iterates the registry, times each test and fills the results matrix
pub struct BenchmarkDriver {
    runner: BuildAndTimeRunner,
    host_probe: Arc<dyn HostProbe>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    busy_cpu_threshold: f32,
}

impl BenchmarkDriver {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        host_probe: Arc<dyn HostProbe>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            runner: BuildAndTimeRunner::new(executor, Arc::clone(&time_provider)),
            host_probe,
            time_provider,
            id_provider,
            busy_cpu_threshold: DEFAULT_BUSY_CPU_THRESHOLD,
        }
    }

    /// CPU usage (percent) above which a warning is logged before a test
    pub fn with_busy_cpu_threshold(mut self, threshold: f32) -> Self {
        self.busy_cpu_threshold = threshold;
        self
    }

    /// Run every test in the registry `plan.passes` times.
    ///
    /// A shutdown signal stops the run: the test in flight is abandoned
    /// (its future is dropped) and the report is marked interrupted.
    pub async fn run(
        &self,
        registry: &Registry,
        plan: RunPlan,
        listener: &dyn ProgressListener,
        mut shutdown: ShutdownToken,
    ) -> Result<BenchmarkReport> {
        let run_id = self.id_provider.generate_id();
        let started_at_ms = self.time_provider.now_millis();
        let host = Some(self.host_probe.host_info().await);
        let passes = plan.effective_passes();

        info!(
            run_id = %run_id,
            tests = registry.len(),
            passes,
            nx = plan.nx,
            ny = plan.ny,
            "Benchmark run starting"
        );

        let mut matrix = ResultsMatrix::new(registry.lang_techs(), registry.comp_opts());
        let mut outcomes = Vec::new();
        let mut interrupted = false;

        'passes: for pass in 1..=passes {
            listener.pass_started(pass, &plan);

            for descriptor in registry.tests() {
                if shutdown.is_shutdown() {
                    interrupted = true;
                    break 'passes;
                }

                let cpu = self.host_probe.cpu_usage_percent().await;
                if cpu > self.busy_cpu_threshold {
                    warn!(
                        test = %descriptor.label(),
                        cpu_usage = %cpu,
                        threshold = %self.busy_cpu_threshold,
                        "Host is busy; timing may be inflated"
                    );
                }

                let timed: TimedRun = tokio::select! {
                    biased;
                    _ = shutdown.wait() => {
                        warn!(test = %descriptor.label(), "Run interrupted");
                        interrupted = true;
                        break 'passes;
                    }
                    timed = self.runner.build_and_time(descriptor, plan.nx, plan.ny) => timed,
                };

                let result = match timed.outcome {
                    Ok(elapsed_secs) => {
                        let kiter_secs = elapsed_secs / timed.nrpt as f64 * ITERATIONS_PER_UNIT;
                        matrix.record(&descriptor.lang_tech, &descriptor.comp_opt, kiter_secs)?;
                        OutcomeKind::Timed {
                            elapsed_secs,
                            kiter_secs,
                        }
                    }
                    Err(failure) => OutcomeKind::Failed(failure),
                };

                let outcome = TestOutcome {
                    pass,
                    lang_tech: descriptor.lang_tech.clone(),
                    comp_opt: descriptor.comp_opt.clone(),
                    nrpt: timed.nrpt,
                    result,
                };
                listener.test_finished(&outcome);
                outcomes.push(outcome);
            }
        }

        let fastest = matrix.fastest();
        match &fastest {
            Some(f) => info!(
                lang_tech = %f.lang_tech,
                comp_opt = %f.comp_opt,
                kiter_secs = f.kiter_secs,
                "Fastest combination found"
            ),
            None => warn!("No test produced a timing"),
        }

        Ok(BenchmarkReport {
            run_id,
            started_at_ms,
            finished_at_ms: self.time_provider.now_millis(),
            plan,
            host,
            tests: registry
                .tests()
                .iter()
                .map(|t| CellRef {
                    lang_tech: t.lang_tech.clone(),
                    comp_opt: t.comp_opt.clone(),
                })
                .collect(),
            outcomes,
            matrix,
            fastest,
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::domain::TestDescriptor;
    use crate::port::command_executor::mocks::{MockBehavior, ScriptedExecutor};
    use crate::port::host_probe::mocks::MockHostProbe;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    impl ProgressListener for RecordingListener {
        fn pass_started(&self, pass: u32, plan: &RunPlan) {
            self.events
                .lock()
                .unwrap()
                .push(format!("pass {}/{}", pass, plan.passes));
        }

        fn test_finished(&self, outcome: &TestOutcome) {
            let status = match outcome.result {
                OutcomeKind::Timed { .. } => "ok",
                OutcomeKind::Failed(_) => "failed",
            };
            self.events
                .lock()
                .unwrap()
                .push(format!("{} / {}: {}", outcome.lang_tech, outcome.comp_opt, status));
        }
    }

    fn registry() -> Registry {
        Registry::new(vec![
            TestDescriptor::new("Rust", "Rustc -O", "./fast", 1000),
            TestDescriptor::new("Python : lists", "Python3", "./slow", 10),
            TestDescriptor::new("Julia", "julia", "./broken", 100),
        ])
        .unwrap()
    }

    fn driver(executor: ScriptedExecutor, clock: Arc<ManualTimeProvider>) -> BenchmarkDriver {
        BenchmarkDriver::new(
            Arc::new(executor.with_clock(clock.clone())),
            Arc::new(MockHostProbe::new(5.0)),
            clock,
            Arc::new(SequentialIdProvider::default()),
        )
    }

    fn scripted() -> ScriptedExecutor {
        ScriptedExecutor::new()
            // 1000 repeats: (1.1 - 0.1) * 1000/999 s => ~1.001 ms per 1K
            .on("./fast 1000", MockBehavior::succeed(1.1))
            .on("./fast 1", MockBehavior::succeed(0.1))
            // 10 repeats: (5.5 - 1.0) * 10/9 = 5 s => 500 s per 1K
            .on("./slow 10", MockBehavior::succeed(5.5))
            .on("./slow 1", MockBehavior::succeed(1.0))
            .on("./broken", MockBehavior::fail("segfault"))
    }

    #[tokio::test]
    async fn test_run_fills_matrix_and_finds_fastest() {
        let clock = Arc::new(ManualTimeProvider::new());
        let driver = driver(scripted(), clock);
        let (_tx, token) = shutdown_channel();
        let plan = RunPlan {
            passes: 1,
            nx: 2000,
            ny: 10,
        };

        let report = driver
            .run(&registry(), plan, &NoopListener, token)
            .await
            .unwrap();

        assert_eq!(report.run_id, "run-1");
        assert!(!report.interrupted);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.tests.len(), 3);
        assert_eq!(report.host.as_ref().unwrap().cpu_brand, "Mock CPU");

        let fast = report.matrix.get("Rust", "Rustc -O").unwrap();
        assert!((fast - 1000.0 / 999.0).abs() < 1e-9);
        let slow = report.matrix.get("Python : lists", "Python3").unwrap();
        assert!((slow - 500.0).abs() < 1e-9);
        assert_eq!(report.matrix.get("Julia", "julia").unwrap(), 0.0);

        let fastest = report.fastest.as_ref().unwrap();
        assert_eq!(fastest.lang_tech, "Rust");
        assert_eq!(fastest.comp_opt, "Rustc -O");
        assert_eq!(report.bench_kiter_secs(), fast);

        match &report.outcomes[2].result {
            OutcomeKind::Failed(failure) => assert_eq!(failure.detail, "segfault"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_passes_keep_best_time() {
        let clock = Arc::new(ManualTimeProvider::new());
        let driver = driver(scripted(), clock);
        let listener = RecordingListener::default();
        let (_tx, token) = shutdown_channel();
        let plan = RunPlan {
            passes: 2,
            nx: 2000,
            ny: 10,
        };

        let report = driver.run(&registry(), plan, &listener, token).await.unwrap();

        assert_eq!(report.outcomes.len(), 6);
        assert_eq!(report.outcomes[3].pass, 2);
        let events = listener.events.lock().unwrap().clone();
        assert_eq!(events[0], "pass 1/2");
        assert_eq!(events[4], "pass 2/2");
        assert_eq!(events[3], "Julia / julia: failed");
    }

    #[tokio::test]
    async fn test_zero_passes_runs_once() {
        let clock = Arc::new(ManualTimeProvider::new());
        let driver = driver(scripted(), clock);
        let (_tx, token) = shutdown_channel();
        let plan = RunPlan {
            passes: 0,
            nx: 20,
            ny: 2,
        };

        let report = driver.run(&registry(), plan, &NoopListener, token).await.unwrap();
        assert_eq!(report.outcomes.len(), 3);
    }

    #[tokio::test]
    async fn test_nothing_succeeds() {
        let clock = Arc::new(ManualTimeProvider::new());
        let executor = ScriptedExecutor::new().on("./fast", MockBehavior::fail("boom"));
        let driver = driver(executor, clock);
        let registry =
            Registry::new(vec![TestDescriptor::new("Rust", "Rustc", "./fast", 1000)]).unwrap();
        let (_tx, token) = shutdown_channel();
        let plan = RunPlan {
            passes: 1,
            nx: 2000,
            ny: 10,
        };

        let report = driver.run(&registry, plan, &NoopListener, token).await.unwrap();
        assert!(report.fastest.is_none());
        assert_eq!(report.bench_kiter_secs(), 1.0);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_stops_run() {
        let clock = Arc::new(ManualTimeProvider::new());
        let executor = Arc::new(scripted().with_clock(clock.clone()));
        let driver = BenchmarkDriver::new(
            executor.clone(),
            Arc::new(MockHostProbe::new(95.0)),
            clock,
            Arc::new(SequentialIdProvider::default()),
        )
        .with_busy_cpu_threshold(90.0);
        let (tx, token) = shutdown_channel();
        tx.shutdown();
        let plan = RunPlan {
            passes: 3,
            nx: 2000,
            ny: 10,
        };

        let report = driver.run(&registry(), plan, &NoopListener, token).await.unwrap();

        assert!(report.interrupted);
        assert!(report.outcomes.is_empty());
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_busy_host_still_runs_every_test() {
        let clock = Arc::new(ManualTimeProvider::new());
        let probe = Arc::new(MockHostProbe::new(5.0));
        probe.set_cpu_usage(95.0);
        let driver = BenchmarkDriver::new(
            Arc::new(scripted().with_clock(clock.clone())),
            probe.clone(),
            clock,
            Arc::new(SequentialIdProvider::default()),
        )
        .with_busy_cpu_threshold(50.0);
        let (_tx, token) = shutdown_channel();
        let plan = RunPlan {
            passes: 2,
            nx: 2000,
            ny: 10,
        };

        let report = driver.run(&registry(), plan, &NoopListener, token).await.unwrap();

        // Sampled before each test of each pass
        assert_eq!(probe.cpu_samples(), 6);
        assert!(!report.interrupted);
        assert_eq!(report.outcomes.len(), 6);
        assert_eq!(report.fastest.as_ref().unwrap().lang_tech, "Rust");
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let clock = Arc::new(ManualTimeProvider::new());
        let driver = driver(ScriptedExecutor::new(), clock);
        let (_tx, token) = shutdown_channel();
        let plan = RunPlan {
            passes: 1,
            nx: 2000,
            ny: 10,
        };

        let report = driver
            .run(&Registry::default(), plan, &NoopListener, token)
            .await
            .unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.fastest.is_none());
    }
}
