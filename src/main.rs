//! Pagerun CLI: paginate a SQLite table and run it through the stage pipeline.

use anyhow::Result;
use clap::Parser;
use pagerun::engine::arg_parser::Cli;
use pagerun::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
