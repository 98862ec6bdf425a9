// Port Layer - Interfaces for external dependencies

pub mod command_executor;
pub mod host_probe;
pub mod id_provider; // For deterministic testing
pub mod time_provider;

// Re-exports
pub use command_executor::{CommandExecutor, CommandOutput, ExecutionError, ExecutionStatus};
pub use host_probe::{HostInfo, HostProbe};
pub use id_provider::IdProvider;
pub use time_provider::TimeProvider;
