use anyhow::Result;
use clap::Parser;
use dca::cli::{Cli, normalize_legacy_args};
use dca::logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_legacy_args(std::env::args()));
    init_logging(cli.verbose, cli.quiet);
    dca::app::run(&cli)
}
