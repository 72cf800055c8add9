mod commands;
mod fragment_file;
mod manifest;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "shardweave")]
#[command(about = "Shardweave - Reed-Solomon erasure coding for files", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into erasure-coded fragments
    Split {
        /// Input file
        #[arg(short, long)]
        input: String,

        /// Directory for fragment files and the manifest
        #[arg(short, long)]
        output: String,

        /// Data fragments
        #[arg(short, default_value = "4")]
        k: usize,

        /// Fragments that may fail
        #[arg(short, default_value = "1")]
        t: usize,
    },

    /// Rebuild a file from its fragments
    Recombine {
        /// Manifest written by `split`
        #[arg(short, long)]
        manifest: String,

        /// Output file
        #[arg(short, long)]
        output: String,
    },

    /// Show the block geometry for a parameter pair
    Inspect {
        /// Data fragments
        #[arg(short)]
        k: usize,

        /// Fragments that may fail
        #[arg(short)]
        t: usize,

        /// Input size to compute the fragment length for
        #[arg(long)]
        size: Option<usize>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Split { input, output, k, t } => commands::split::execute(&input, &output, k, t),

        Commands::Recombine { manifest, output } => {
            commands::recombine::execute(&manifest, &output)
        }

        Commands::Inspect { k, t, size, json } => commands::inspect::execute(k, t, size, json),
    }
}
