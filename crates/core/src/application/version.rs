// Version reporter
// Lists the version of each compiler/interpreter used by the registry

use crate::application::constants::VERSION_LABEL_WIDTH;
use crate::domain::CommandLine;
use crate::port::CommandExecutor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A toolchain label and the command that prints its version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionQuery {
    pub label: String,
    pub command: String,
}

impl VersionQuery {
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
        }
    }
}

/// Toolchains used by the built-in registry
pub fn default_version_queries() -> Vec<VersionQuery> {
    [
        ("Clang", "c++ --version"),
        ("Assembler", "c++ --version"),
        ("Gcc", "g++ --version"),
        ("Gfortran", "gfortran --version"),
        ("R", "Rscript --version"),
        ("Python2", "python --version"),
        ("Python3", "python3 --version"),
        ("Java", "java -version"),
        ("Node.js", "node --version"),
        ("Tcl", "tclsh ver.tcl"),
        ("Swift", "xcrun swiftc --version"),
        ("Julia", "julia --version"),
        ("Rust", "rustc --version"),
        ("Cargo", "cargo --version"),
        ("Perl/PDL", "pdl -V"),
    ]
    .into_iter()
    .map(|(label, command)| VersionQuery::new(label, command))
    .collect()
}

/// Runs version queries and formats the first line of their output
pub struct VersionReporter {
    executor: Arc<dyn CommandExecutor>,
}

impl VersionReporter {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Lines to print for one toolchain.
    ///
    /// Tools disagree about where the version goes (`java -version` uses
    /// stderr), so the first line of each stream is reported when non-empty.
    pub async fn report(&self, query: &VersionQuery) -> Vec<String> {
        let label = format!("{:<width$}", query.label, width = VERSION_LABEL_WIDTH);

        let Some(command) = CommandLine::parse(&query.command) else {
            return vec![format!("Unable to get version for {} : no command given", label)];
        };

        let output = match self.executor.execute(&command).await {
            Ok(output) if output.success() => output,
            Ok(_) | Err(_) => {
                debug!(command = %command, "Version query failed");
                return vec![format!(
                    "Unable to get version for {} : Error executing '{}'",
                    label, command
                )];
            }
        };

        [output.stdout.as_str(), output.stderr.as_str()]
            .into_iter()
            .filter_map(|stream| stream.lines().next())
            .filter(|line| !line.is_empty())
            .map(|line| format!("{} : {}", label, line))
            .collect()
    }

    /// Report every query in order
    pub async fn report_all(&self, queries: &[VersionQuery]) -> Vec<String> {
        let mut lines = Vec::new();
        for query in queries {
            lines.extend(self.report(query).await);
        }
        lines
    }
}
