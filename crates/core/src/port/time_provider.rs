// Time Provider Port (for testability)

use std::time::Instant;

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current wall-clock time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Monotonic seconds since an arbitrary origin, used for timing runs
    fn monotonic_secs(&self) -> f64;
}

/// System time provider (production)
pub struct SystemTimeProvider {
    origin: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn monotonic_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Wall-clock origin for the manual provider (2024-01-01T00:00:00Z)
    const EPOCH_MILLIS: i64 = 1_704_067_200_000;

    /// Clock that only moves when told to
    #[derive(Default)]
    pub struct ManualTimeProvider {
        secs: Mutex<f64>,
    }

    impl ManualTimeProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn advance(&self, secs: f64) {
            *self.secs.lock().unwrap() += secs;
        }
    }

    impl TimeProvider for ManualTimeProvider {
        fn now_millis(&self) -> i64 {
            EPOCH_MILLIS + (*self.secs.lock().unwrap() * 1000.0) as i64
        }

        fn monotonic_secs(&self) -> f64 {
            *self.secs.lock().unwrap()
        }
    }
}
