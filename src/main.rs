//! verctrl - lightweight file versioning
//!
//! Main binary entry point for the command-line interface.

use clap::Parser;
use verctrl::cli::{self, Cli};
use verctrl::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    cli::run(cli)
}
