use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// How SHA digests are turned into reply text.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DigestFormat {
    /// Lowercase hexadecimal.
    #[default]
    Hex,
    /// Digest bytes decoded as UTF-8, invalid sequences replaced.
    Raw,
}

impl std::fmt::Display for DigestFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestFormat::Hex => write!(f, "hex"),
            DigestFormat::Raw => write!(f, "raw"),
        }
    }
}

/// Which integers a numeric `[a-b]` / `(a-b)` range covers.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumericRange {
    /// Every integer from `a` to `b`, both ends included.
    #[default]
    Inclusive,
    /// `b` integers starting at `a`.
    Counted,
}

impl std::fmt::Display for NumericRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericRange::Inclusive => write!(f, "inclusive"),
            NumericRange::Counted => write!(f, "counted"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub randomizer: RandomizerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// An empty token turns the polling loop into a no-op.
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RandomizerConfig {
    /// Fixed seed for the random source. Seeded from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub digest_format: DigestFormat,
    #[serde(default)]
    pub numeric_range: NumericRange,
}

/// Output size guards. `0` disables a limit.
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_range_len")]
    pub max_range_len: usize,
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_cron")]
    pub cron: String,
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_max_range_len() -> usize {
    100_000
}

fn default_max_string_len() -> usize {
    100_000
}

fn default_heartbeat_cron() -> String {
    "0 0 * * * *".to_string()
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_range_len: default_max_range_len(),
            max_string_len: default_max_string_len(),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            cron: default_heartbeat_cron(),
        }
    }
}

impl TelegramConfig {
    pub fn is_enabled(&self) -> bool {
        !self.bot_token.trim().is_empty()
    }

    /// Delay between polls. Also used, in whole seconds, as the long-poll timeout.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid TOML configuration")?;

        if config.telegram.poll_interval_secs == 0 {
            anyhow::bail!("telegram.poll_interval_secs must be at least 1");
        }

        Ok(config)
    }
}
