// Test Descriptor Domain Model

use crate::domain::command::CommandLine;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Delimiter used by the results matrix; labels must not contain it
pub const MATRIX_DELIMITER: char = ',';

/// Maximum number of build steps a descriptor may declare
pub const MAX_BUILD_STEPS: usize = 2;

/// Minimum repeat count needed to subtract the single-repeat overhead
pub const MIN_REPEATS: u64 = 2;

/// One registry entry: how to build, run and clean up a test program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDescriptor {
    /// Language and coding technique, e.g. "C : raw"
    pub lang_tech: String,
    /// Compiler or interpreter plus flags, e.g. "g++ -O3"
    pub comp_opt: String,
    /// Build commands, run in order (at most two)
    #[serde(default)]
    pub build: Vec<String>,
    /// Command that runs the test, without the repeat/shape parameters
    pub run: String,
    /// Repeat count for the timed run
    pub repeats: u64,
    /// Command that removes build artifacts
    #[serde(default)]
    pub cleanup: Option<String>,
}

impl TestDescriptor {
    pub fn new(
        lang_tech: impl Into<String>,
        comp_opt: impl Into<String>,
        run: impl Into<String>,
        repeats: u64,
    ) -> Self {
        Self {
            lang_tech: lang_tech.into(),
            comp_opt: comp_opt.into(),
            build: Vec::new(),
            run: run.into(),
            repeats,
            cleanup: None,
        }
    }

    /// Add a build step
    pub fn with_build(mut self, command: impl Into<String>) -> Self {
        self.build.push(command.into());
        self
    }

    /// Set the cleanup command
    pub fn with_cleanup(mut self, command: impl Into<String>) -> Self {
        self.cleanup = Some(command.into());
        self
    }

    /// "<lang_tech> / <comp_opt>", used in logs and filters
    pub fn label(&self) -> String {
        format!("{} / {}", self.lang_tech, self.comp_opt)
    }

    /// Repeat count actually used for timing (never below two)
    pub fn effective_repeats(&self) -> u64 {
        self.repeats.max(MIN_REPEATS)
    }

    /// Non-blank build commands, in order
    pub fn build_commands(&self) -> Vec<CommandLine> {
        self.build
            .iter()
            .filter_map(|c| CommandLine::parse(c))
            .collect()
    }

    pub fn cleanup_command(&self) -> Option<CommandLine> {
        self.cleanup.as_deref().and_then(CommandLine::parse)
    }

    /// The run command with "<nrpt> <nx> <ny>" appended
    pub fn run_command(&self, nrpt: u64, nx: usize, ny: usize) -> Result<CommandLine> {
        let base = CommandLine::parse(&self.run)
            .ok_or_else(|| self.invalid("run command is empty"))?;
        Ok(base.with_args([nrpt.to_string(), nx.to_string(), ny.to_string()]))
    }

    /// Check the descriptor can be run and reported
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("language", &self.lang_tech), ("compiler", &self.comp_opt)] {
            if value.trim().is_empty() {
                return Err(self.invalid(format!("{} label is empty", name)));
            }
            if value.contains(MATRIX_DELIMITER) {
                return Err(self.invalid(format!(
                    "{} label must not contain '{}'",
                    name, MATRIX_DELIMITER
                )));
            }
        }

        if CommandLine::parse(&self.run).is_none() {
            return Err(self.invalid("run command is empty"));
        }

        if self.build.len() > MAX_BUILD_STEPS {
            return Err(self.invalid(format!(
                "at most {} build commands allowed, got {}",
                MAX_BUILD_STEPS,
                self.build.len()
            )));
        }

        if self.repeats == 0 {
            return Err(self.invalid("repeat count must be positive"));
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> DomainError {
        DomainError::InvalidDescriptor {
            label: self.label(),
            reason: reason.into(),
        }
    }
}
