//! imagecache CLI - Command-line interface
//!
//! Resolves, prefetches and manages cached images using the imagecache
//! library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{entries, get, init, sync};
use error::CliError;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "imagecache")]
#[command(version = imagecache::VERSION)]
#[command(about = "Disk-backed image cache with background fill", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.imagecache/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Cache root directory, overriding [cache] directory
    #[arg(long, global = true, value_name = "PATH")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one image to a local path or its remote URL
    Get(get::GetArgs),

    /// Cache a set of images, optionally dropping everything else
    Sync(sync::SyncArgs),

    /// List the entries stored in a namespace
    List(entries::NamespaceArgs),

    /// Delete every entry stored in a namespace
    Clear(entries::NamespaceArgs),

    /// Create the default config file if it doesn't exist
    InitConfig,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = GlobalOptions {
        config_path: cli.config,
        cache_dir: cli.cache_dir,
    };

    match cli.command {
        Commands::Get(args) => get::run(&options, args),
        Commands::Sync(args) => sync::run(&options, args),
        Commands::List(args) => entries::run_list(&options, args),
        Commands::Clear(args) => entries::run_clear(&options, args),
        Commands::InitConfig => init::run(&options),
    }
}
