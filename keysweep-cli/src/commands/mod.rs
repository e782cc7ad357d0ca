//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod fingerprint;
mod job;

pub use job::JobCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Search job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Print the SHA-256 fingerprint of a text
    Fingerprint {
        /// Text to fingerprint
        text: String,
    },
    /// Check that the server is reachable
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Fingerprint { text } => {
            println!("{}", fingerprint::sha256_hex(&text));
            Ok(())
        }
        Commands::Health => job::check_health(config).await,
    }
}
