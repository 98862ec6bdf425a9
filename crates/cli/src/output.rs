// Console output
// Prints progress while the run goes and the final summary afterwards

use arraybench_core::application::report::{
    fastest_line, matrix_lines, outcome_line, pass_header, summary_lines,
};
use arraybench_core::application::{
    BenchmarkReport, OutcomeKind, ProgressListener, RunPlan, TestOutcome,
};
use arraybench_core::domain::Registry;
use colored::Colorize;
use tabled::{Table, Tabled};

/// Streams pass headers and per-test lines to stdout
pub struct ConsolePrinter;

impl ProgressListener for ConsolePrinter {
    fn pass_started(&self, pass: u32, plan: &RunPlan) {
        println!();
        for line in pass_header(pass, plan) {
            println!("{}", line);
        }
        println!();
    }

    fn test_finished(&self, outcome: &TestOutcome) {
        let line = outcome_line(outcome);
        match outcome.result {
            OutcomeKind::Timed { .. } => println!("{}", line),
            OutcomeKind::Failed(_) => println!("{}", line.red()),
        }
    }
}

pub fn print_section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
    println!();
}

pub fn print_summary(report: &BenchmarkReport) {
    if report.interrupted {
        println!();
        println!("{}", "Run interrupted; results cover completed tests only".yellow());
    }

    let fastest = fastest_line(report);
    match report.fastest {
        Some(_) => println!("{}", fastest.green().bold()),
        None => println!("{}", fastest.yellow()),
    }

    print_section("Summary of relative speeds:");
    for line in summary_lines(report) {
        println!("{}", line);
    }

    println!();
    for line in matrix_lines(report) {
        println!("{}", line);
    }
}

#[derive(Tabled)]
struct TestRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Language / technique")]
    lang_tech: String,
    #[tabled(rename = "Compiler / options")]
    comp_opt: String,
    #[tabled(rename = "Repeats")]
    repeats: u64,
    #[tabled(rename = "Run")]
    run: String,
}

pub fn print_registry(registry: &Registry) {
    let rows: Vec<TestRow> = registry
        .tests()
        .iter()
        .enumerate()
        .map(|(i, t)| TestRow {
            index: i + 1,
            lang_tech: t.lang_tech.clone(),
            comp_opt: t.comp_opt.clone(),
            repeats: t.effective_repeats(),
            run: t.run.clone(),
        })
        .collect();

    println!("{}", Table::new(rows));
    println!();
    println!("{} {}", "Tests:".bold(), registry.len());
}
