// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid descriptor '{label}': {reason}")]
    InvalidDescriptor { label: String, reason: String },

    #[error("Unknown language/technique: {0}")]
    UnknownLangTech(String),

    #[error("Unknown compiler/options: {0}")]
    UnknownCompOpt(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
