use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod logging;

#[derive(Parser)]
#[command(version, about = "Render markdown pages through per-page templates")]
struct Args {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    command: MubCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::CONFIG_FILE_NAME)]
    config_file: Option<PathBuf>,

    /// Render pages marked `draft: true`
    #[arg(long)]
    drafts: bool,

    /// Number of pages rendered at once (defaults to the number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Parser)]
struct CheckArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::CONFIG_FILE_NAME)]
    config_file: Option<PathBuf>,

    /// Check pages marked `draft: true` too
    #[arg(long)]
    drafts: bool,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::CONFIG_FILE_NAME)]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum MubCommand {
    /// Initialize a new mub project
    Init(InitArgs),

    /// Render every page into the output directory
    Build(BuildArgs),

    /// Parse, resolve and render every page without writing anything
    Check(CheckArgs),

    /// Delete the output directory
    Clean(CleanArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    match args.command {
        MubCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        MubCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        MubCommand::Check(args) => {
            commands::check::run(&args).await?;
        }
        MubCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
    }

    Ok(())
}
