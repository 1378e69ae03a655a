// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, parse arguments, hand over to `ui`.
// - Logs go to stderr so stdout only carries the post summary.

use blogpub::{cli::Cli, ui};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    ui::run(cli)
}
