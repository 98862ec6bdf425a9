// Harness constants (No magic values)

/// Default array width (columns). 2000 is deliberately not a multiple of a
/// large power of two, and the built-in repeat counts assume it.
pub const DEFAULT_NX: usize = 2000;

/// Default array height (rows)
pub const DEFAULT_NY: usize = 10;

/// Default number of passes through the full test set
pub const DEFAULT_PASSES: u32 = 1;

/// Iterations per reported unit ("1K Iter")
pub const ITERATIONS_PER_UNIT: f64 = 1000.0;

/// CPU usage above which a test is flagged as running on a busy host (percent)
pub const DEFAULT_BUSY_CPU_THRESHOLD: f32 = 50.0;

/// Width the version labels are padded to
pub const VERSION_LABEL_WIDTH: usize = 9;
