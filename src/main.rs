//! extbuild - browser extension build orchestrator

use std::process::ExitCode;

use extbuild::cli;

fn main() -> ExitCode {
    cli::run()
}
