// CLI application
use anyhow::Context;
use bzclient_cli::commands::{list_blocks, list_events, print_report, run_scripts, RunOptions};
use bzclient_cli::config::ClientConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bzclient")]
#[command(about = "Headless driver for the BZFlag client event core")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print every event with its order, loop type and properties
    Events {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print gfx block type names and global block ids
    Blocks,
    /// Load Lua scripts and run them against a headless GL backend
    Run {
        /// Lua scripts to load after the ones in the config file
        scripts: Vec<PathBuf>,

        /// Number of frames to run
        #[arg(short, long, default_value_t = 60)]
        frames: u64,

        /// Lose and restore the GL context every N frames
        #[arg(long)]
        reset_every: Option<u64>,

        /// Config file (default: the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Events { json } => list_events(json)?,
        Commands::Blocks => list_blocks(),
        Commands::Run {
            scripts,
            frames,
            reset_every,
            config,
            quiet,
        } => {
            let config = match config {
                Some(path) => ClientConfig::load_from(&path)?,
                None => ClientConfig::load().context("Failed to load user config")?,
            };
            let options = RunOptions {
                scripts,
                frames,
                reset_every,
                config,
                progress: !quiet,
            };
            let report = run_scripts(&options)?;
            print_report(&report);
            if report.leaked_objects > 0 || report.double_deletes > 0 {
                anyhow::bail!(
                    "GL object accounting failed: {} leaked, {} double deletes",
                    report.leaked_objects,
                    report.double_deletes
                );
            }
        }
    }

    Ok(())
}
