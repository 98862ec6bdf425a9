// Domain Layer - Pure benchmark model (descriptors, registry, results)

pub mod command;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod results;

// Re-exports
pub use command::CommandLine;
pub use descriptor::TestDescriptor;
pub use error::DomainError;
pub use registry::Registry;
pub use results::{Fastest, ResultsMatrix};
