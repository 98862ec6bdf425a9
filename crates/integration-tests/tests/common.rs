//! Shared fixtures: a scratch working directory and a driver wired to real
//! subprocesses

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arraybench_core::application::BenchmarkDriver;
use arraybench_core::port::host_probe::mocks::MockHostProbe;
use arraybench_core::port::id_provider::mocks::SequentialIdProvider;
use arraybench_core::port::time_provider::SystemTimeProvider;
use arraybench_infra_system::SubprocessExecutor;

/// Fresh scratch directory under the system temp dir
pub fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("arraybench-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_script(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}

pub fn executor(dir: &Path, timeout: Option<Duration>) -> Arc<SubprocessExecutor> {
    Arc::new(
        SubprocessExecutor::new(Arc::new(SystemTimeProvider::new()))
            .with_working_dir(dir)
            .with_timeout(timeout),
    )
}

pub fn driver(executor: Arc<SubprocessExecutor>) -> BenchmarkDriver {
    BenchmarkDriver::new(
        executor,
        Arc::new(MockHostProbe::new(1.0)),
        Arc::new(SystemTimeProvider::new()),
        Arc::new(SequentialIdProvider::default()),
    )
}
