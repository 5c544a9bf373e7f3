//! wt CLI - Wikitext compiler.
//!
//! Provides commands for:
//! - `render`: Compile wikitext files to HTML
//! - `links`: List the local pages referenced by wikitext files

mod commands;
mod error;
mod output;
mod pages;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{LinksArgs, RenderArgs};
use output::Output;

/// wt - Wikitext compiler.
#[derive(Parser)]
#[command(name = "wt", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render wikitext files to HTML on stdout.
    Render(RenderArgs),
    /// List pages linked from wikitext files.
    Links(LinksArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Render(args) => args.common.verbose,
        Commands::Links(args) => args.common.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Links(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
