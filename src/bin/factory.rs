//! Steady-state factory planner.
//!
//! Reads one JSON problem instance from standard input and writes either a
//! machine-minimal plan or an infeasibility certificate to standard output.

use anyhow::Result;
use clap::Parser;

use prodplan::models::FactoryInput;
use prodplan::{factory, io};

#[derive(Parser)]
#[command(name = "factory")]
#[command(about = "Steady-state production planner (JSON on stdin, JSON on stdout)")]
struct Cli {}

fn main() -> Result<()> {
    let _cli = Cli::parse();
    env_logger::init();

    let input: FactoryInput = io::read_instance()?;
    let outcome = factory::solve(&input)?;
    io::write_result(&outcome)?;
    Ok(())
}
