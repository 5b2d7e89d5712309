use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info};

/// Outcome of a pull that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing new on the remote, the work tree was left untouched
    UpToDate,
    /// New commits were merged into the work tree
    Updated,
}

/// Capability to update a local repository from one of its remotes
///
/// An `Err` is a failed synchronization; the caller decides whether it is worth retrying.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Synchronizer: Send + Sync {
    /// Pull from `remote` into the local work tree
    async fn synchronize(&self, remote: &str) -> Result<SyncStatus>;
}

/// A local git work tree driven through the `git` command line
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Open an existing work tree at or above `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            bail!("Repository path does not exist: {}", path.display());
        }

        let output = AsyncCommand::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .await
            .context("Failed to execute git, is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Not a git work tree: {} ({})",
                path.display(),
                stderr.trim()
            ));
        }

        let root = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        debug!("Opened repository work tree at {}", root.display());

        Ok(Self { root })
    }

    /// Top level directory of the work tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL configured for `remote`, if that remote exists
    pub async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        let output = self
            .git(&["remote", "get-url", remote])
            .await
            .context("Failed to get remote URL")?;

        if output.status.success() {
            let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(url))
        } else {
            Ok(None)
        }
    }

    /// Commit currently checked out, `None` for a repository without commits
    pub async fn head(&self) -> Result<Option<String>> {
        let output = self
            .git(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await
            .context("Failed to resolve HEAD")?;

        if output.status.success() {
            let head = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(head))
        } else {
            Ok(None)
        }
    }

    async fn git(&self, args: &[&str]) -> Result<Output> {
        AsyncCommand::new("git")
            .args(args)
            .current_dir(&self.root)
            // Never block on an interactive credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .with_context(|| format!("Failed to execute git {}", args.join(" ")))
    }
}

#[async_trait]
impl Synchronizer for GitRepository {
    async fn synchronize(&self, remote: &str) -> Result<SyncStatus> {
        let before = self.head().await?;

        let output = self
            .git(&["pull", "--ff-only", remote])
            .await
            .context("Failed to pull from remote")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git pull from '{}' failed: {}", remote, stderr.trim());
        }

        let after = self.head().await?;

        if before == after {
            debug!("Repository is up to date: {}", self.root.display());
            return Ok(SyncStatus::UpToDate);
        }

        info!(
            "Pulled {} -> {} in {}",
            short_hash(before.as_deref()),
            short_hash(after.as_deref()),
            self.root.display()
        );
        Ok(SyncStatus::Updated)
    }
}

fn short_hash(hash: Option<&str>) -> &str {
    match hash {
        Some(hash) => hash.get(..8).unwrap_or(hash),
        None => "(none)",
    }
}
