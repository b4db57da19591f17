use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod dataset;
mod logging;
mod proxy;

#[derive(Parser)]
#[command(version, about = "Location-page generator and API proxies for a fencing business")]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// The command to execute (defaults to `generate`)
    #[command(subcommand)]
    command: Option<FencesiteCommand>,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser, Default)]
struct GenerateArgs {
    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Report out-of-date pages without writing anything
    #[arg(long, default_value = "false")]
    check: bool,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// The port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum FencesiteCommand {
    /// Write a default fencesite.yaml
    Init(InitArgs),

    /// Generate one page per location record
    Generate(GenerateArgs),

    /// Generate pages, then serve them together with the API proxies
    Serve(ServeArgs),

    /// Delete the generated pages
    Clean(CleanArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    match args.command {
        Some(FencesiteCommand::Init(args)) => {
            commands::init::run(&args).await?;
        }
        Some(FencesiteCommand::Generate(args)) => {
            commands::generate::run(&args).await?;
        }
        None => {
            commands::generate::run(&GenerateArgs::default()).await?;
        }
        Some(FencesiteCommand::Serve(args)) => {
            commands::serve::run(&args).await?;
        }
        Some(FencesiteCommand::Clean(args)) => {
            commands::clean::run(&args).await?;
        }
    }

    Ok(())
}
