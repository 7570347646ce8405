//! bookrelease CLI: build and publish the book's release artifacts.
//!
//! Derives trade-size and preview PDFs from the compiled editions, splits
//! chapters, and replaces the GitHub release that hosts them.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
