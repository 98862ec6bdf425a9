// Report formatting
// Fixed-width text lines and the delimited relative-speed matrix

use crate::application::driver::{BenchmarkReport, OutcomeKind, RunPlan, TestOutcome};
use crate::domain::descriptor::MATRIX_DELIMITER;

/// Format like C's `%<width>.<precision>g`: the shorter of fixed and
/// exponential notation, trailing zeros removed, right-aligned in `width`.
pub fn format_g(value: f64, width: usize, precision: usize) -> String {
    format!("{:>width$}", g_digits(value, precision), width = width)
}

fn g_digits(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    // Round first so the exponent reflects carries (9.96 -> 1.0e1)
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_trailing_zeros(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Lines printed before each pass
pub fn pass_header(pass: u32, plan: &RunPlan) -> Vec<String> {
    let headline = if plan.passes > 1 {
        format!(
            "Starting pass {} of {} through full set of tests",
            pass, plan.passes
        )
    } else {
        "Running through full set of timing tests".to_string()
    };
    vec![
        headline,
        String::new(),
        format!("Arrays used: {} columns, {} rows", plan.nx, plan.ny),
    ]
}

/// One line per finished test
pub fn outcome_line(outcome: &TestOutcome) -> String {
    match &outcome.result {
        OutcomeKind::Timed {
            elapsed_secs,
            kiter_secs,
        } => format!(
            "{:>24} {:>20} Rept: {:>8} Elap: {:>10.2} 1K Iter: {}",
            outcome.lang_tech,
            outcome.comp_opt,
            outcome.nrpt,
            elapsed_secs,
            format_g(*kiter_secs, 10, 2)
        ),
        OutcomeKind::Failed(failure) => format!(
            "{} {} Error: {} {}",
            outcome.lang_tech, outcome.comp_opt, failure.message, failure.detail
        )
        .trim_end()
        .to_string(),
    }
}

pub fn fastest_line(report: &BenchmarkReport) -> String {
    match &report.fastest {
        Some(f) => format!("Fastest combination is  {} and {}", f.lang_tech, f.comp_opt),
        None => "No test produced a timing".to_string(),
    }
}

/// Per-test best time and speed relative to the fastest cell, registry order
pub fn summary_lines(report: &BenchmarkReport) -> Vec<String> {
    let bench = report.bench_kiter_secs();
    report
        .tests
        .iter()
        .map(|cell| {
            let kiter_secs = report
                .matrix
                .get(&cell.lang_tech, &cell.comp_opt)
                .unwrap_or(0.0);
            format!(
                "{:>24} {:>20} 1K Iter: {}, Relative time {:>12.2}",
                cell.lang_tech,
                cell.comp_opt,
                format_g(kiter_secs, 10, 2),
                kiter_secs / bench
            )
        })
        .collect()
}

/// Relative-speed matrix: a header of languages, then one row per compiler.
/// Empty cells stay empty.
pub fn matrix_lines(report: &BenchmarkReport) -> Vec<String> {
    let delimiter = MATRIX_DELIMITER.to_string();
    let bench = report.bench_kiter_secs();
    let matrix = &report.matrix;

    let mut header = vec!["Compiler".to_string()];
    header.extend(matrix.lang_techs().iter().cloned());

    let mut lines = vec![header.join(&delimiter)];
    for comp_opt in matrix.comp_opts() {
        let mut row = vec![comp_opt.clone()];
        for lang_tech in matrix.lang_techs() {
            let relative = matrix.relative(lang_tech, comp_opt, bench).unwrap_or(0.0);
            row.push(if relative > 0.0 {
                format!("{:.2}", relative)
            } else {
                String::new()
            });
        }
        lines.push(row.join(&delimiter));
    }
    lines
}
