// array-kernel - the Rust entry in the arraybench registry
// Usage: array-kernel [--layout nested|iterators|unchecked|flat] NRPT NX NY

use anyhow::Result;
use arraybench_kernel::Layout;
use clap::Parser;

#[derive(Parser)]
#[command(name = "array-kernel")]
#[command(about = "Add the index sum to every element of a 2D array, NRPT times", long_about = None)]
struct Cli {
    /// Array storage and loop style
    #[arg(long, value_enum, default_value_t = Layout::Nested)]
    layout: Layout,

    /// Times the kernel is applied
    nrpt: u64,

    /// Columns
    nx: usize,

    /// Rows
    ny: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!(
        "Arrays have {} rows of {} columns, repeats = {}",
        cli.ny, cli.nx, cli.nrpt
    );

    arraybench_kernel::run(cli.layout, cli.nrpt, cli.nx, cli.ny)?;
    Ok(())
}
