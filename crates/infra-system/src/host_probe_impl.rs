// Host probe implementation
// reason: sysinfo for cross-platform host description and CPU load
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use sysinfo::System;
use tracing::debug;

use arraybench_core::port::host_probe::{HostInfo, HostProbe};

/// Host probe implementation using sysinfo
pub struct SysinfoHostProbe {
    system: Mutex<System>,
}

impl SysinfoHostProbe {
    /// Create a new host probe
    ///
    /// # Example
    /// ```ignore
    /// let probe = SysinfoHostProbe::new();
    /// ```
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        // A panic while refreshing leaves nothing half-written worth discarding
        self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SysinfoHostProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostProbe for SysinfoHostProbe {
    async fn host_info(&self) -> HostInfo {
        let mut sys = self.system();
        sys.refresh_memory();

        let cpu_brand = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_default();

        let info = HostInfo {
            hostname: System::host_name(),
            os: System::long_os_version(),
            kernel: System::kernel_version(),
            cpu_brand,
            logical_cpus: sys.cpus().len(),
            physical_cores: sys.physical_core_count(),
            memory_total_mb: sys.total_memory() / 1024 / 1024,
        };

        debug!(host = %info, "Host described");
        info
    }

    async fn cpu_usage_percent(&self) -> f32 {
        // Usage is a delta between two refreshes
        self.system().refresh_cpu();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;

        let mut sys = self.system();
        sys.refresh_cpu();
        let cpu_usage_percent = sys.global_cpu_info().cpu_usage();

        debug!(cpu = %cpu_usage_percent, "CPU usage sampled");
        cpu_usage_percent
    }
}
