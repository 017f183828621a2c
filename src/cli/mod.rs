pub mod inspect;
pub mod output;
pub mod run;
pub mod runtime;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use inspect::{cmd_inspect, InspectArgs};
pub use output::OutputFormat;
pub use run::{cmd_run, RunArgs};

/// PagePilot - drive fixture pages through scripted planning sessions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(
        short,
        long,
        env = "PAGEPILOT_LOG",
        default_value = "warn",
        global = true
    )]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scripted planning session against a fixture page
    Run(RunArgs),

    /// Print the context snapshot of a fixture page
    Inspect(InspectArgs),

    /// Print the effective configuration
    Config,
}

pub async fn execute(cli: Cli) -> Result<()> {
    let loaded = runtime::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Run(args) => cmd_run(args, &loaded.config, cli.output).await,
        Commands::Inspect(args) => cmd_inspect(args, &loaded.config, cli.output).await,
        Commands::Config => cmd_config(&loaded, cli.output),
    }
}

fn cmd_config(loaded: &runtime::LoadedConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&loaded.config)?),
        OutputFormat::Human | OutputFormat::Yaml => {
            match &loaded.path {
                Some(path) => println!("# source: {}", path.display()),
                None => println!("# source: defaults"),
            }
            print!("{}", serde_yaml::to_string(&loaded.config)?);
        }
    }
    Ok(())
}
