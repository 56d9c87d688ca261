//! examprint CLI — assign exam questions, validate sign-ups, print papers.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "examprint",
    version,
    about = "Exam question assignment and print preparation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign questions to every written sign-up that has none yet
    Assign {
        /// Output directory for reports (defaults to output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate and render exam papers and signature forms
    Print {
        /// Output directory (defaults to output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Days to print, comma-separated (e.g. "1,2"); overrides days_to_print
        #[arg(long)]
        days: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check sign-ups, question availability and image files without writing
    Validate {
        /// Output directory for reports (defaults to output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete every persisted question assignment
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and an empty data directory
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("examprint=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assign { output, config } => commands::assign::execute(output, config).await,
        Commands::Print {
            output,
            days,
            config,
        } => commands::print::execute(output, days, config).await,
        Commands::Validate { output, config } => commands::validate::execute(output, config).await,
        Commands::Clear { yes, config } => commands::clear::execute(yes, config).await,
        Commands::Init => commands::init::execute().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
