//! SteadyCut CLI: replay tick logs and work with edit plans.
//!
//! Usage:
//!   steadycut plan <TICKS>       Replay a tick log and write its edit plan
//!   steadycut validate <PLAN>    Check an edit plan's structure
//!   steadycut info <PLAN>        Show an edit plan's segments
//!   steadycut jobs <PLAN>        List remediation jobs with dry-run outputs

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use steadycut_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "steadycut",
    about = "Turn shaky-footage classifications into an editable timeline",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/steadycut/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL tick log through a session and write the edit plan
    Plan {
        /// Path to the tick log
        ticks: PathBuf,

        /// Source recording; enables BRIDGE eligibility
        #[arg(short, long)]
        recording: Option<String>,

        /// Output plan path (defaults to <TICKS>.plan.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Attach captions from <RECORDING>.captions.json
        #[arg(long, requires = "recording")]
        captions: bool,
    },

    /// Validate an edit plan
    Validate {
        /// Path to the plan JSON
        path: PathBuf,
    },

    /// Show edit plan information
    Info {
        /// Path to the plan JSON
        path: PathBuf,
    },

    /// List remediation jobs for a plan
    Jobs {
        /// Path to the plan JSON
        path: PathBuf,

        /// Directory dry-run outputs are reported under
        #[arg(long, default_value = "renders")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    steadycut_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Plan {
            ticks,
            recording,
            output,
            captions,
        } => commands::plan::run(&config, ticks, recording, output, captions).await,
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Jobs { path, output_dir } => commands::jobs::run(path, output_dir).await,
    }
}
