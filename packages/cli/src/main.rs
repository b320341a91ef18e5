mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{edit, list, EditArgs, ListArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Folio CLI - load HTML into an editor session, edit it, render it back
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Editor config file (defaults to ./folio.config.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log dispatch decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a document, run commands and key presses, print the result
    Edit(EditArgs),

    /// List the loaded plugins and their commands
    Commands(ListArgs),
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = config::load(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Edit(args) => edit(args, config).await,
        Command::Commands(args) => list(args, config).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}
