// Application Layer - Use cases: build & time, version listing, driving a full run

pub mod constants;
pub mod driver;
pub mod report;
pub mod runner;
pub mod shutdown;
pub mod version;

// Re-exports
pub use driver::{
    BenchmarkDriver, BenchmarkReport, CellRef, NoopListener, OutcomeKind, ProgressListener, RunPlan,
    TestOutcome,
};
pub use runner::{BuildAndTimeRunner, RunFailure, Step, TimedRun};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use version::{default_version_queries, VersionQuery, VersionReporter};
