// Settings
// Layered configuration: built-in defaults <- arraybench.toml (or --config)
// <- ARRAYBENCH_* environment variables. Command-line flags are applied last
// by main.

use anyhow::{Context, Result};
use arraybench_core::application::constants::{
    DEFAULT_BUSY_CPU_THRESHOLD, DEFAULT_NX, DEFAULT_NY, DEFAULT_PASSES,
};
use arraybench_core::application::{default_version_queries, VersionQuery};
use arraybench_core::domain::{Registry, TestDescriptor};
use config::{Config, Environment, File};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked for in the current directory when --config is absent
pub const DEFAULT_CONFIG_FILE: &str = "arraybench.toml";
const ENV_PREFIX: &str = "ARRAYBENCH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Passes through the full set of tests
    pub ntests: u32,
    pub nx: usize,
    pub ny: usize,
    /// Directory holding the test sources; `~` is expanded
    pub workdir: String,
    /// Cargo workspace the array-kernel entries are built from (default:
    /// the workspace arraybench was built in)
    pub kernel_dir: Option<String>,
    /// Per-command limit; unset means no limit
    pub command_timeout_secs: Option<u64>,
    pub busy_cpu_threshold: f32,
    /// Start from the built-in table (otherwise only `tests` are run)
    pub include_builtin: bool,
    /// Extra descriptors appended after the built-in table
    pub tests: Vec<TestDescriptor>,
    /// Extra version queries appended after the defaults
    pub versions: Vec<VersionQuery>,
    pub skip_versions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ntests: DEFAULT_PASSES,
            nx: DEFAULT_NX,
            ny: DEFAULT_NY,
            workdir: ".".to_string(),
            kernel_dir: None,
            command_timeout_secs: None,
            busy_cpu_threshold: DEFAULT_BUSY_CPU_THRESHOLD,
            include_builtin: true,
            tests: Vec::new(),
            versions: Vec::new(),
            skip_versions: false,
        }
    }
}

impl Settings {
    /// Load from the config file and the process environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_from(config_path, None)
    }

    /// `env` replaces the process environment when given
    fn load_from(config_path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let file = match config_path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn workdir_path(&self) -> PathBuf {
        expand_dir(&self.workdir)
    }

    pub fn kernel_dir_path(&self) -> Option<PathBuf> {
        self.kernel_dir.as_deref().map(expand_dir)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Registry to run: built-in table (optional) plus configured tests,
    /// narrowed by `filter` when given
    pub fn registry(&self, filter: Option<&Regex>) -> Result<Registry> {
        let mut registry = match (self.include_builtin, self.kernel_dir_path()) {
            (true, Some(kernel_dir)) => Registry::builtin_with_kernel_dir(&kernel_dir),
            (true, None) => Registry::builtin(),
            (false, _) => Registry::default(),
        };
        registry
            .extend(self.tests.clone())
            .context("Invalid test in configuration")?;

        Ok(match filter {
            Some(pattern) => registry.filter(pattern),
            None => registry,
        })
    }

    pub fn version_queries(&self) -> Vec<VersionQuery> {
        let mut queries = default_version_queries();
        queries.extend(self.versions.iter().cloned());
        queries
    }
}

/// Expand `~` and anchor relative paths at the current directory
fn expand_dir(dir: &str) -> PathBuf {
    let dir = PathBuf::from(shellexpand::tilde(dir).into_owned());
    std::path::absolute(&dir).unwrap_or(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "arraybench-{}-{}.toml",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings =
            Settings::load_from(Some(&write_config("empty", "")), no_env()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.ntests, 1);
        assert_eq!(settings.nx, 2000);
        assert_eq!(settings.ny, 10);
        assert!(settings.command_timeout().is_none());
    }

    #[test]
    fn test_file_values_and_extra_tests() {
        let path = write_config(
            "file",
            r#"
nx = 500
include_builtin = false
command_timeout_secs = 60

[[tests]]
lang_tech = "Zig"
comp_opt = "zig -O ReleaseFast"
build = ["zig build-exe -O ReleaseFast csub.zig"]
run = "./csub"
repeats = 1000
cleanup = "rm -f csub"

[[versions]]
label = "Zig"
command = "zig version"
"#,
        );

        let settings = Settings::load_from(Some(&path), no_env()).unwrap();

        assert_eq!(settings.nx, 500);
        assert_eq!(settings.ny, 10);
        assert_eq!(settings.command_timeout(), Some(Duration::from_secs(60)));

        let registry = settings.registry(None).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.tests()[0].build.len(), 1);
        assert_eq!(registry.tests()[0].cleanup.as_deref(), Some("rm -f csub"));

        let versions = settings.version_queries();
        assert_eq!(versions.last().unwrap().command, "zig version");
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = write_config("env", "ny = 20\nnx = 100\n");
        let env = HashMap::from([
            ("ARRAYBENCH_NY".to_string(), "5".to_string()),
            ("ARRAYBENCH_SKIP_VERSIONS".to_string(), "true".to_string()),
        ]);

        let settings = Settings::load_from(Some(&path), Some(env)).unwrap();

        assert_eq!(settings.nx, 100);
        assert_eq!(settings.ny, 5);
        assert!(settings.skip_versions);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let path = PathBuf::from("/nonexistent/arraybench-missing.toml");
        assert!(Settings::load_from(Some(&path), no_env()).is_err());
    }

    #[test]
    fn test_invalid_configured_test_rejected() {
        let path = write_config(
            "invalid",
            r#"
[[tests]]
lang_tech = "C, raw"
comp_opt = "gcc"
run = "./a.out"
repeats = 10
"#,
        );
        let settings = Settings::load_from(Some(&path), no_env()).unwrap();
        assert!(settings.registry(None).is_err());
    }

    #[test]
    fn test_registry_filter() {
        let settings = Settings::default();
        let filter = Regex::new("^Rust / ").unwrap();

        let registry = settings.registry(Some(&filter)).unwrap();

        assert!(!registry.is_empty());
        assert!(registry.tests().iter().all(|t| t.lang_tech == "Rust"));
    }

    #[test]
    fn test_kernel_dir_setting() {
        let path = write_config("kernel", "kernel_dir = \"/opt/arraybench\"\n");
        let settings = Settings::load_from(Some(&path), no_env()).unwrap();

        let registry = settings
            .registry(Some(&Regex::new("^Rust : flat").unwrap()))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.tests()[0].run,
            "/opt/arraybench/target/release/array-kernel --layout flat"
        );
        assert!(Settings::default().kernel_dir_path().is_none());
    }

    #[test]
    fn test_workdir_path() {
        let settings = Settings {
            workdir: "/srv/arrays".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.workdir_path(), PathBuf::from("/srv/arrays"));

        let settings = Settings {
            workdir: "bench".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            settings.workdir_path(),
            std::env::current_dir().unwrap().join("bench")
        );

        if let Ok(home) = std::env::var("HOME") {
            let settings = Settings {
                workdir: "~/arrays".to_string(),
                ..Settings::default()
            };
            assert_eq!(settings.workdir_path(), Path::new(&home).join("arrays"));
        }
    }
}
