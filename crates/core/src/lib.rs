// arraybench Core - Domain Logic, Ports & Timing Services
// NO process or OS dependencies (adapters live in infra-system)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
