//! shootclock: terminal host and glance renderer for Shootclock.
//!
//! ## Subcommands
//!
//! - `run`: interactive session timer (boots the store, ticks at 1 Hz)
//! - `glance`: read-only renderer for the shared snapshot
//! - `tags`: manage shot tags in the durable store
//! - `boot`: run startup arbitration once and print the outcome

mod boot;
mod glance;
mod logging;
mod run;
mod tags;

use clap::{Parser, Subcommand};
use shoot_core::config::load_config;
use shoot_core::storage::StorageConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shootclock")]
#[command(about = "Shoot/select session timer")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to $SHOOTCLOCK_HOME or ~/.shootclock)
    #[arg(long, global = true, value_name = "PATH")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive timer; reads commands from stdin
    Run,

    /// Render the shared glance snapshot
    Glance {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Keep redrawing on the renderer refresh schedule
        #[arg(long)]
        watch: bool,
    },

    /// Manage shot tags
    Tags {
        #[command(subcommand)]
        command: tags::TagCommand,
    },

    /// Run startup once and print the outcome as JSON
    Boot,
}

fn main() {
    let cli = Cli::parse();

    let storage = match cli.home {
        Some(root) => StorageConfig::with_root(root),
        None => match StorageConfig::from_env() {
            Ok(storage) => storage,
            Err(e) => {
                eprintln!("shootclock: {}", e);
                std::process::exit(1);
            }
        },
    };
    let _logging_guard = logging::init(&storage.logs_dir());
    let config = load_config(&storage);

    let result = match cli.command {
        Commands::Run => run::run(&storage, &config),
        Commands::Glance { json, watch } => glance::run(&storage, &config, json, watch),
        Commands::Tags { command } => tags::run(&storage, &config, command),
        Commands::Boot => boot::run(&storage, &config),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "shootclock failed");
        eprintln!("shootclock: {}", e);
        std::process::exit(1);
    }
}
