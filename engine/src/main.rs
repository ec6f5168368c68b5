//! Shim binary that calls into the `reaper_engine` library's `inner_main`.
use clap::Parser as _;
use eyre::Result;

use reaper_engine::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    reaper_engine::inner_main(Cli::parse()).await
}
