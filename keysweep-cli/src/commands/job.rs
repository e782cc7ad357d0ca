//! Job command handlers
//!
//! Handles submitting searches, polling their status, and cancelling them.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use keysweep_client::KeysweepClient;
use keysweep_core::domain::job::{JobSnapshot, JobStatus};
use keysweep_core::dto::job::SubmitSearch;
use uuid::Uuid;

use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a new search
    Submit {
        /// Target fingerprint (hex SHA-256 unless the server uses the literal matcher)
        fingerprint: String,

        /// Characters to build candidates from, in enumeration order
        #[arg(short, long)]
        alphabet: String,

        /// Longest candidate to try
        #[arg(short = 'l', long)]
        max_length: i64,

        /// Follow the job until it finishes
        #[arg(short, long)]
        wait: bool,

        /// Poll interval in milliseconds when following
        #[arg(long, default_value_t = 500)]
        interval: u64,
    },
    /// Show status, progress, and result
    Status {
        /// Job ID
        id: Uuid,
    },
    /// Show every recorded field of a job
    Detail {
        /// Job ID
        id: Uuid,
    },
    /// Request cancellation
    Cancel {
        /// Job ID
        id: Uuid,
    },
    /// Follow a job until it finishes
    Wait {
        /// Job ID
        id: Uuid,

        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval: u64,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = KeysweepClient::new(&config.server_url);

    match command {
        JobCommands::Submit {
            fingerprint,
            alphabet,
            max_length,
            wait,
            interval,
        } => {
            let req = SubmitSearch {
                fingerprint,
                alphabet,
                max_length,
            };
            let id = submit(&client, &req).await?;
            if wait {
                wait_for_job(&client, id, interval).await?;
            }
            Ok(())
        }
        JobCommands::Status { id } => show_status(&client, id).await,
        JobCommands::Detail { id } => show_detail(&client, id).await,
        JobCommands::Cancel { id } => cancel(&client, id).await,
        JobCommands::Wait { id, interval } => wait_for_job(&client, id, interval).await,
    }
}

/// Check server health
pub async fn check_health(config: &Config) -> Result<()> {
    let client = KeysweepClient::new(&config.server_url);
    client
        .health()
        .await
        .with_context(|| format!("Server at {} is not reachable", config.server_url))?;
    println!("{} {}", "✓".green(), format!("{} is up", config.server_url).bold());
    Ok(())
}

async fn submit(client: &KeysweepClient, req: &SubmitSearch) -> Result<Uuid> {
    let response = client
        .submit_search(req)
        .await
        .context("Failed to submit search")?;

    println!("{}", "Search submitted".green().bold());
    println!("  Job ID: {}", response.job_id.to_string().cyan());

    Ok(response.job_id)
}

async fn show_status(client: &KeysweepClient, id: Uuid) -> Result<()> {
    let status = client.get_status(id).await?;

    println!("  Status:   {}", colorize_status(status.status));
    println!("  Progress: {}%", status.progress);
    if let Some(result) = &status.result {
        println!("  Result:   {}", result.green().bold());
    }

    Ok(())
}

async fn show_detail(client: &KeysweepClient, id: Uuid) -> Result<()> {
    let snapshot = client.get_job_detail(id).await?;
    print_job_details(&snapshot);
    Ok(())
}

async fn cancel(client: &KeysweepClient, id: Uuid) -> Result<()> {
    client.cancel_job(id).await?;
    println!("{} {}", "Cancellation requested for".yellow(), id.to_string().cyan());
    Ok(())
}

async fn wait_for_job(client: &KeysweepClient, id: Uuid, interval_ms: u64) -> Result<()> {
    let mut last_percent = None;

    let snapshot = client
        .wait_for_completion(id, Duration::from_millis(interval_ms.max(1)), |snapshot| {
            let percent = snapshot.progress_percent();
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                println!(
                    "  {} {:>3}% {}",
                    "▸".cyan(),
                    percent,
                    colorize_status(snapshot.status)
                );
            }
        })
        .await?;

    println!();
    print_job_details(&snapshot);
    Ok(())
}

/// Print detailed job information
fn print_job_details(job: &JobSnapshot) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.id.to_string().cyan());
    println!("  Status:    {}", colorize_status(job.status));
    println!(
        "  Progress:  {}/{} ({}%)",
        job.progress_count,
        job.total_keyspace,
        job.progress_percent()
    );
    println!("  Created:   {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated:   {}", job.updated_at.format("%Y-%m-%d %H:%M:%S"));

    let elapsed = job.updated_at.signed_duration_since(job.created_at);
    println!("  Elapsed:   {}ms", elapsed.num_milliseconds());

    if let Some(result) = &job.result {
        println!("\n{}", "Result:".bold());
        println!("  {}", result.green().bold());
    }

    if let Some(reason) = &job.failure_reason {
        println!("\n{}", "Error:".bold());
        println!("  {}", reason.red());
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Queued => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Succeeded => status_str.green(),
        JobStatus::NotFound => status_str.magenta(),
        JobStatus::Cancelled => status_str.dimmed(),
        JobStatus::Failed => status_str.red(),
    }
}
