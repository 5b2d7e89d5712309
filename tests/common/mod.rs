//! Common test utilities and helpers for pullexec tests

use assert_fs::fixture::PathChild;
use assert_fs::TempDir;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Whether a usable `git` binary is on the PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run git in `dir` with a throwaway identity, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=pullexec tests",
            "-c",
            "user.email=tests@pullexec.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A bare `origin`, an `upstream` clone that publishes commits, and a `mirror`
/// clone that plays the role of the watched repository
pub struct TestRemote {
    pub temp_dir: TempDir,
    pub origin: PathBuf,
    pub upstream: PathBuf,
    pub mirror: PathBuf,
    commits: std::cell::Cell<u32>,
}

impl TestRemote {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let origin = temp_dir.child("origin.git").path().to_path_buf();
        let upstream = temp_dir.child("upstream").path().to_path_buf();
        let mirror = temp_dir.child("mirror").path().to_path_buf();

        git(temp_dir.path(), &["init", "--quiet", "--bare", "origin.git"]);
        git(temp_dir.path(), &["clone", "--quiet", "origin.git", "upstream"]);

        let remote = Self {
            temp_dir,
            origin,
            upstream,
            mirror,
            commits: std::cell::Cell::new(0),
        };

        remote.commit_upstream("initial");
        git(&remote.upstream, &["push", "--quiet", "-u", "origin", "HEAD"]);
        git(
            remote.temp_dir.path(),
            &["clone", "--quiet", "origin.git", "mirror"],
        );

        remote
    }

    /// Commit a new file in the upstream clone without publishing it
    pub fn commit_upstream(&self, message: &str) {
        let n = self.commits.get() + 1;
        self.commits.set(n);

        std::fs::write(self.upstream.join(format!("file-{}.txt", n)), message)
            .expect("Failed to write file");
        git(&self.upstream, &["add", "--all"]);
        git(&self.upstream, &["commit", "--quiet", "-m", message]);
    }

    /// Commit and push a change so that the mirror falls behind
    pub fn push_change(&self, message: &str) {
        self.commit_upstream(message);
        git(&self.upstream, &["push", "--quiet", "origin", "HEAD"]);
    }

    pub fn mirror_head(&self) -> String {
        git(&self.mirror, &["rev-parse", "HEAD"])
    }

    pub fn upstream_head(&self) -> String {
        git(&self.upstream, &["rev-parse", "HEAD"])
    }

    /// A path inside the temp dir that nothing else uses
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.temp_dir.child(name).path().to_path_buf()
    }
}

/// The pullexec binary, isolated from any user configuration file
pub fn pullexec(config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pullexec"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG");
    cmd
}

/// Assertion helper for process output
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
