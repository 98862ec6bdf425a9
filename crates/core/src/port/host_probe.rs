// Host probe port
// Describes the machine a run happens on and samples its CPU load
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Static description of the benchmark host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: Option<String>,
    pub os: Option<String>,
    pub kernel: Option<String>,
    pub cpu_brand: String,
    pub logical_cpus: usize,
    pub physical_cores: Option<usize>,
    pub memory_total_mb: u64,
}

impl std::fmt::Display for HostInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}), {}, {} logical CPUs",
            self.hostname.as_deref().unwrap_or("unknown host"),
            self.os.as_deref().unwrap_or("unknown OS"),
            self.cpu_brand,
            self.logical_cpus
        )?;
        if let Some(cores) = self.physical_cores {
            write!(f, " / {} cores", cores)?;
        }
        write!(f, ", {} MB", self.memory_total_mb)
    }
}

/// Host probe port
///
/// Timings taken on a loaded machine are unreliable; the driver uses
/// `cpu_usage_percent` to flag that.
#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Describe the host
    async fn host_info(&self) -> HostInfo;

    /// Current global CPU usage (0.0 - 100.0)
    async fn cpu_usage_percent(&self) -> f32;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock HostProbe for testing
    pub struct MockHostProbe {
        cpu_usage_percent: Arc<Mutex<f32>>,
        samples: Arc<Mutex<u32>>,
    }

    impl MockHostProbe {
        pub fn new(cpu_usage_percent: f32) -> Self {
            Self {
                cpu_usage_percent: Arc::new(Mutex::new(cpu_usage_percent)),
                samples: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_cpu_usage(&self, cpu_usage_percent: f32) {
            *self.cpu_usage_percent.lock().unwrap() = cpu_usage_percent;
        }

        /// Number of CPU load samples taken so far
        pub fn cpu_samples(&self) -> u32 {
            *self.samples.lock().unwrap()
        }
    }

    #[async_trait]
    impl HostProbe for MockHostProbe {
        async fn host_info(&self) -> HostInfo {
            HostInfo {
                hostname: Some("testhost".to_string()),
                os: Some("TestOS 1.0".to_string()),
                kernel: None,
                cpu_brand: "Mock CPU".to_string(),
                logical_cpus: 8,
                physical_cores: Some(4),
                memory_total_mb: 16_384,
            }
        }

        async fn cpu_usage_percent(&self) -> f32 {
            *self.samples.lock().unwrap() += 1;
            *self.cpu_usage_percent.lock().unwrap()
        }
    }
}
