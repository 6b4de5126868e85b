//! Configuration types for trail.
//!
//! [`Config::load`] reads `~/.config/trail/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist, then applies `TRAIL__*`
//! environment overrides (`TRAIL__TAIL__POLL_INTERVAL_MS=50`).
//! [`Config::defaults`] returns the same defaults without touching the
//! filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CachePolicy;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[tail]
start_at           = "end"
poll_interval_ms   = 250
read_chunk_bytes   = 65536
max_retries        = 5
backoff_initial_ms = 100
backoff_max_ms     = 5000

[cache]
policy      = "single-slot"
max_entries = 0
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration, loaded from `~/.config/trail/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tail: TailConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Where a tail session starts reading a file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartAt {
    Beginning,
    End,
}

/// `[tail]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TailConfig {
    #[serde(default = "default_start_at")]
    pub start_at: StartAt,
    /// Upper bound on how long the tailer sleeps between checks when no
    /// change notification arrives.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
    /// Consecutive I/O failures tolerated before a session terminates.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_start_at() -> StartAt { StartAt::End }
fn default_poll_interval_ms() -> u64 { 250 }
fn default_read_chunk_bytes() -> usize { 64 * 1024 }
fn default_max_retries() -> u32 { 5 }
fn default_backoff_initial_ms() -> u64 { 100 }
fn default_backoff_max_ms() -> u64 { 5_000 }

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            start_at: default_start_at(),
            poll_interval_ms: default_poll_interval_ms(),
            read_chunk_bytes: default_read_chunk_bytes(),
            max_retries: default_max_retries(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl TailConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms.max(self.backoff_initial_ms))
    }
}

/// `[cache]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_policy")]
    pub policy: CachePolicyKind,
    /// Only used by the keyed policy. `0` means unbounded.
    #[serde(default)]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicyKind {
    SingleSlot,
    Keyed,
}

fn default_cache_policy() -> CachePolicyKind { CachePolicyKind::SingleSlot }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: default_cache_policy(),
            max_entries: 0,
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        match self.policy {
            CachePolicyKind::SingleSlot => CachePolicy::SingleSlot,
            CachePolicyKind::Keyed => CachePolicy::Keyed {
                max_entries: (self.max_entries > 0).then_some(self.max_entries),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/trail/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Load an explicit file layered on the defaults. The file may be absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("TRAIL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("trail")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
