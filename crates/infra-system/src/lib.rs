// arraybench Infrastructure - System Adapters
// Implements: CommandExecutor, HostProbe

pub mod host_probe_impl;
pub mod subprocess_executor;

pub use host_probe_impl::SysinfoHostProbe;
pub use subprocess_executor::SubprocessExecutor;
