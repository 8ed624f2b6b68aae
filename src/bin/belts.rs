//! Belt-network feasibility checker.
//!
//! Reads one JSON problem instance from standard input and writes either a
//! feasible flow or a min-cut certificate to standard output.

use anyhow::Result;
use clap::Parser;

use prodplan::models::BeltsInput;
use prodplan::{belts, io};

#[derive(Parser)]
#[command(name = "belts")]
#[command(about = "Belt-network flow checker (JSON on stdin, JSON on stdout)")]
struct Cli {}

fn main() -> Result<()> {
    let _cli = Cli::parse();
    env_logger::init();

    let input: BeltsInput = io::read_instance()?;
    let outcome = belts::solve(&input);
    io::write_result(&outcome)?;
    Ok(())
}
