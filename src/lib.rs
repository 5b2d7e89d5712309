//! pullexec - Pull a git repository on an interval and run a command on change
//!
//! pullexec keeps an already cloned repository in sync with its `origin` remote and
//! executes a configured command whenever a pull brings in new commits.
//!
//! ## Behavior
//!
//! - **Idle polling**: a pull that finds nothing new never runs the command
//! - **Bounded retries**: failed pulls are tolerated until more than `max_retries`
//!   of them happen in a row, then the process exits
//! - **Fatal commands**: a failing command stops the process immediately
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading, command line overrides and validation
//! - [`git`]: Repository synchronization through the git command line
//! - [`runner`]: Command execution through the platform shell
//! - [`sync`]: The poll/execute/retry loop

pub mod config;
pub mod git;
pub mod runner;
pub mod sync;

pub use config::{Config, ConfigOverrides};
pub use git::{GitRepository, SyncStatus, Synchronizer};
pub use runner::{CommandRunner, ShellCommandRunner};
pub use sync::{SyncLoop, TickOutcome, DEFAULT_REMOTE};
