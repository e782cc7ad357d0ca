//! Server configuration
//!
//! Defines all configurable parameters for the server including the worker
//! pool size, the keyspace guard, progress cadence, and retention.

use std::time::Duration;

use anyhow::Context;

use crate::matcher::MatcherKind;
use crate::scheduler::WorkerSettings;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to (e.g., "0.0.0.0:8080")
    pub bind_addr: String,

    /// Number of searches allowed to run at the same time
    pub max_parallel_jobs: usize,

    /// Largest `max_length` a submission may request
    pub max_length_limit: usize,

    /// Candidates evaluated between progress writes and cancellation checks
    pub progress_interval: u64,

    /// Pause after each candidate
    pub candidate_delay: Duration,

    /// How candidates are compared to fingerprints
    pub matcher: MatcherKind,

    /// Age after which finished jobs are dropped; `None` keeps them forever
    pub retention: Option<Duration>,

    /// How often the retention sweep runs
    pub sweep_interval: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - KEYSWEEP_BIND_ADDR (default: 0.0.0.0:8080)
    /// - MAX_PARALLEL_JOBS (default: 2)
    /// - MAX_LENGTH_LIMIT (default: 8)
    /// - PROGRESS_INTERVAL (candidates, default: 100)
    /// - CANDIDATE_DELAY_MS (default: 0)
    /// - MATCHER (sha256 | literal, default: sha256)
    /// - RETENTION_SECS (default: unset, keep finished jobs)
    /// - SWEEP_INTERVAL_SECS (default: 60)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any variable source
    ///
    /// Unset or unparsable numeric values fall back to their defaults; an
    /// unknown matcher name is an error.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = var("KEYSWEEP_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let max_parallel_jobs = var("MAX_PARALLEL_JOBS")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_parallel_jobs);

        let max_length_limit = var("MAX_LENGTH_LIMIT")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_length_limit);

        let progress_interval = var("PROGRESS_INTERVAL")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.progress_interval);

        let candidate_delay = var("CANDIDATE_DELAY_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.candidate_delay);

        let matcher = match var("MATCHER") {
            Some(value) => value
                .parse::<MatcherKind>()
                .with_context(|| format!("Invalid MATCHER value {:?}", value))?,
            None => defaults.matcher,
        };

        let retention = var("RETENTION_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        let sweep_interval = var("SWEEP_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);

        Ok(Self {
            bind_addr,
            max_parallel_jobs,
            max_length_limit,
            progress_interval,
            candidate_delay,
            matcher,
            retention,
            sweep_interval,
        })
    }

    /// Settings handed to every search worker
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            progress_interval: self.progress_interval,
            candidate_delay: self.candidate_delay,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.max_parallel_jobs == 0 {
            anyhow::bail!("max_parallel_jobs must be greater than 0");
        }

        if self.max_length_limit == 0 {
            anyhow::bail!("max_length_limit must be greater than 0");
        }

        if self.progress_interval == 0 {
            anyhow::bail!("progress_interval must be greater than 0");
        }

        if self.retention.is_some() && self.sweep_interval.is_zero() {
            anyhow::bail!("sweep_interval must be greater than 0 when retention is enabled");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            max_parallel_jobs: 2,
            max_length_limit: 8,
            progress_interval: 100,
            candidate_delay: Duration::ZERO,
            matcher: MatcherKind::Sha256,
            retention: None,
            sweep_interval: Duration::from_secs(60),
        }
    }
}
