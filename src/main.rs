use std::process::ExitCode;

use clap::Parser;
use drawanywhere::cli::{self, CliArgs};
use drawanywhere::logger;

fn main() -> ExitCode {
    // The session log is truncated on every launch.
    logger::init();
    let args = CliArgs::parse();
    cli::run(args)
}
