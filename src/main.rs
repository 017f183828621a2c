use anyhow::Result;
use clap::Parser;
use pagepilot_cli::cli::{self, runtime, Cli};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    runtime::init_logging(&cli.log_level, cli.debug, cli.log_json)?;
    info!("Starting PagePilot v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = cli::execute(cli).await {
        error!("Command failed: {:#}", err);
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}
