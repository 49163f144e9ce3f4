use clap::Parser;
use stratsweep::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
