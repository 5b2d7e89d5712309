//! Sync Loop - Pull, execute on change, sleep, repeat
//!
//! Each iteration pulls the repository from its origin remote and classifies the
//! result as up to date, updated or failed. Only an update runs the configured
//! command. Failed pulls are tolerated until more than `max_retries` of them
//! happen back to back; a failing command is never retried.

use crate::config::Config;
use crate::git::{SyncStatus, Synchronizer};
use crate::runner::CommandRunner;
use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Remote every pull is made against
pub const DEFAULT_REMOTE: &str = "origin";

/// What a single non-fatal iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing new upstream, the command was skipped
    Idle,
    /// Changes were pulled and the command completed successfully
    Executed,
    /// The pull failed; `failures` is the current run of consecutive failures
    Retrying { failures: u32 },
}

/// The poll/execute/retry loop
pub struct SyncLoop<S, R> {
    config: Config,
    synchronizer: S,
    runner: R,
    consecutive_failures: u32,
}

impl<S: Synchronizer, R: CommandRunner> SyncLoop<S, R> {
    pub fn new(config: Config, synchronizer: S, runner: R) -> Self {
        Self {
            config,
            synchronizer,
            runner,
            consecutive_failures: 0,
        }
    }

    /// Number of pulls that failed since the last successful one
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run one iteration without the trailing sleep
    ///
    /// Returns `Err` only for fatal conditions: the retry budget is exhausted or the
    /// command failed.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        match self.synchronizer.synchronize(DEFAULT_REMOTE).await {
            Ok(SyncStatus::UpToDate) => {
                self.consecutive_failures = 0;
                debug!("Already up to date, skipping command");
                Ok(TickOutcome::Idle)
            }
            Ok(SyncStatus::Updated) => {
                self.consecutive_failures = 0;
                info!("Changes pulled, executing '{}'", self.config.execute);

                self.runner
                    .run(&self.config.execute)
                    .await
                    .context("Failed to run command")?;

                info!("Command completed successfully");
                Ok(TickOutcome::Executed)
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let failures = self.consecutive_failures;

                if failures > self.config.max_retries {
                    return Err(e.context(format!(
                        "Reached pull retry limit after {} consecutive failures, exiting",
                        failures
                    )));
                }

                warn!(
                    "Unable to pull repository: {:#}. Retrying ({}/{})...",
                    e, failures, self.config.max_retries
                );
                Ok(TickOutcome::Retrying { failures })
            }
        }
    }

    /// Loop forever; only returns on a fatal condition
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Sync loop started: interval {:?}, max retries {}",
            self.config.pull_interval, self.config.max_retries
        );

        loop {
            self.tick().await?;
            sleep(self.config.pull_interval).await;
        }
    }
}
