//! arraybench CLI - times the same 2D array kernel across languages,
//! compilers and coding styles and reports relative speeds

mod logging;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use regex::Regex;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use arraybench_core::application::{
    shutdown_channel, BenchmarkDriver, BenchmarkReport, RunPlan, VersionReporter,
};
use arraybench_core::application::report::matrix_lines;
use arraybench_core::port::id_provider::UuidProvider;
use arraybench_core::port::time_provider::SystemTimeProvider;
use arraybench_core::port::HostProbe;
use arraybench_infra_system::{SubprocessExecutor, SysinfoHostProbe};

use output::ConsolePrinter;
use settings::Settings;

/// Exit status after Ctrl-C (128 + SIGINT)
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "arraybench")]
#[command(about = "Cross-language 2D array access benchmark", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Passes through the full set of tests (best time per test wins)
    ntests: Option<u32>,

    /// Array columns
    nx: Option<usize>,

    /// Array rows
    ny: Option<usize>,

    /// Only run tests whose "language / compiler" label matches
    #[arg(long, global = true)]
    filter: Option<String>,

    /// Config file (default: ./arraybench.toml if present)
    #[arg(long, global = true, env = "ARRAYBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Directory containing the test sources
    #[arg(long, global = true)]
    workdir: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Also write the relative-speed matrix to this file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write the full report as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Skip the compiler/interpreter version listing
    #[arg(long)]
    no_versions: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tests that would run
    List,

    /// Show host details and toolchain versions only
    Versions,
}

impl Cli {
    /// Command-line values win over every configuration layer
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(ntests) = self.ntests {
            settings.ntests = ntests;
        }
        if let Some(nx) = self.nx {
            settings.nx = nx;
        }
        if let Some(ny) = self.ny {
            settings.ny = ny;
        }
        if let Some(workdir) = &self.workdir {
            settings.workdir = workdir.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.command_timeout_secs = Some(timeout);
        }
        if self.no_versions {
            settings.skip_versions = true;
        }
    }

    fn filter(&self) -> Result<Option<Regex>> {
        self.filter
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).with_context(|| format!("Invalid --filter '{}'", pattern))
            })
            .transpose()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_to(&mut settings);

    let registry = settings.registry(cli.filter()?.as_ref())?;

    // DI wiring
    let time_provider = Arc::new(SystemTimeProvider::new());
    let executor = Arc::new(
        SubprocessExecutor::new(time_provider.clone())
            .with_working_dir(settings.workdir_path())
            .with_timeout(settings.command_timeout()),
    );
    let host_probe = Arc::new(SysinfoHostProbe::new());

    match cli.command {
        Some(Commands::List) => {
            output::print_registry(&registry);
            return Ok(());
        }
        Some(Commands::Versions) => {
            print_versions(&settings, executor, host_probe.as_ref()).await;
            return Ok(());
        }
        None => {}
    }

    if !settings.skip_versions {
        print_versions(&settings, executor.clone(), host_probe.as_ref()).await;
    }

    let (shutdown_tx, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping after killing the running test".yellow());
            shutdown_tx.shutdown();
        }
    });

    let driver = BenchmarkDriver::new(
        executor,
        host_probe,
        time_provider,
        Arc::new(UuidProvider),
    )
    .with_busy_cpu_threshold(settings.busy_cpu_threshold);

    let plan = RunPlan {
        passes: settings.ntests,
        nx: settings.nx,
        ny: settings.ny,
    };

    info!(
        workdir = %settings.workdir_path().display(),
        tests = registry.len(),
        "Starting benchmark"
    );

    let report = driver.run(&registry, plan, &ConsolePrinter, shutdown).await?;

    println!();
    output::print_summary(&report);
    write_outputs(&cli, &report)?;

    if report.interrupted {
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    Ok(())
}

async fn print_versions(
    settings: &Settings,
    executor: Arc<SubprocessExecutor>,
    host_probe: &dyn HostProbe,
) {
    output::print_section("Versions:");

    let reporter = VersionReporter::new(executor);
    for line in reporter.report_all(&settings.version_queries()).await {
        println!("{}", line);
    }

    println!();
    println!("{} {}", "Host:".bold(), host_probe.host_info().await);
}

fn write_outputs(cli: &Cli, report: &BenchmarkReport) -> Result<()> {
    if let Some(path) = &cli.csv {
        let mut csv = matrix_lines(report).join("\n");
        csv.push('\n');
        std::fs::write(path, csv)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Matrix written");
    }

    if let Some(path) = &cli.json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Report written");
    }

    if report.outcomes.is_empty() && !report.interrupted {
        warn!("No tests matched; nothing was run");
    }

    Ok(())
}
