use anyhow::{bail, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration for pullexec
///
/// Built once at startup from the optional YAML file and the command line, validated,
/// and then handed to the sync loop by value. Nothing mutates it afterwards.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Local path of the already cloned repository to pull
    #[serde(default = "default_repository_path")]
    pub repository_path: String,

    /// Command to execute after every pull that brought in changes
    #[serde(default)]
    pub execute: String,

    /// Delay between two pulls
    #[serde(
        default = "default_pull_interval",
        deserialize_with = "deserialize_interval"
    )]
    pub pull_interval: Duration,

    /// Maximum successive failed pulls tolerated before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Values given on the command line, each one replacing its file counterpart when set
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub repository_path: Option<String>,
    pub execute: Option<String>,
    pub pull_interval: Option<Duration>,
    pub max_retries: Option<u32>,
}

fn default_repository_path() -> String {
    ".".to_string()
}
fn default_pull_interval() -> Duration {
    Duration::from_secs(60)
}
fn default_max_retries() -> u32 {
    3
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInterval {
    Seconds(u64),
    Text(String),
}

fn deserialize_interval<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawInterval::deserialize(deserializer)? {
        RawInterval::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawInterval::Text(text) => parse_interval(&text).map_err(serde::de::Error::custom),
    }
}

/// Parse an interval such as "90", "30s", "5m", "1h" or "2d"
///
/// A bare number is taken as seconds.
pub fn parse_interval(value: &str) -> Result<Duration> {
    let value = value.trim().to_lowercase();

    let (amount, multiplier) = if let Some(v) = value.strip_suffix('s') {
        (v, 1)
    } else if let Some(v) = value.strip_suffix('m') {
        (v, 60)
    } else if let Some(v) = value.strip_suffix('h') {
        (v, 3600)
    } else if let Some(v) = value.strip_suffix('d') {
        (v, 86400)
    } else {
        (value.as_str(), 1)
    };

    let amount: u64 = amount.trim().parse().with_context(|| {
        format!(
            "Invalid interval '{}'. Use seconds or a format like '30s', '5m', '1h'",
            value
        )
    })?;

    let secs = amount
        .checked_mul(multiplier)
        .with_context(|| format!("Interval '{}' is too large", value))?;

    Ok(Duration::from_secs(secs))
}

impl Config {
    /// Load the configuration file from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading configuration from: {:?}", config_path);
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("pullexec").join("config.yml"))
    }

    /// Replace every field that was given on the command line
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(repository_path) = overrides.repository_path {
            self.repository_path = repository_path;
        }
        if let Some(execute) = overrides.execute {
            self.execute = execute;
        }
        if let Some(pull_interval) = overrides.pull_interval {
            self.pull_interval = pull_interval;
        }
        if let Some(max_retries) = overrides.max_retries {
            self.max_retries = max_retries;
        }
    }

    /// Expand `~` and environment variables in the repository path
    pub fn expand_paths(&mut self) -> Result<()> {
        self.repository_path = shellexpand::full(&self.repository_path)
            .context("Failed to expand repository_path")?
            .into_owned();

        Ok(())
    }

    /// Reject configurations the sync loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.execute.trim().is_empty() {
            bail!(
                "Missing required parameter 'execute'. Please refer to pullexec --help to see which parameters are not defaulted"
            );
        }

        if self.pull_interval.is_zero() {
            bail!("pull_interval must be greater than zero");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository_path: default_repository_path(),
            execute: String::new(),
            pull_interval: default_pull_interval(),
            max_retries: default_max_retries(),
        }
    }
}
