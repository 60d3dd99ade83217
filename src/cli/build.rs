//! Function for building the command line hierarchy.

use super::{inspect::create_inspect_subcommand, sample::create_sample_subcommand};
use clap::{self, Arg, Command};

/// Build the `meshfield` command line hierarchy.
pub fn build() -> Command<'static> {
    Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .disable_help_subcommand(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("timing")
                .short('t')
                .long("timing")
                .global(true)
                .help("Display elapsed time when done"),
        )
        .subcommand(create_sample_subcommand())
        .subcommand(create_inspect_subcommand())
}
