mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    buildlens::output::print_banner();

    let cli = Cli::parse();
    info!("Starting BuildLens");
    cli.execute()?;

    Ok(())
}
