//! Function for running the command line program.

use super::{build, inspect::run_inspect_subcommand, sample::run_sample_subcommand};
use clap::ArgMatches;
use std::time::Instant;

/// Runs the `meshfield` command line program.
pub fn run() {
    run_with_args(build::build().get_matches());
}

/// Runs the `meshfield` command line program with the given parsed arguments.
pub fn run_with_args(arguments: ArgMatches) {
    let start_instant = Instant::now();

    match arguments.subcommand() {
        Some(("sample", sample_arguments)) => run_sample_subcommand(sample_arguments),
        Some(("inspect", inspect_arguments)) => run_inspect_subcommand(inspect_arguments),
        _ => {}
    }

    if arguments.is_present("timing") {
        println!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}
