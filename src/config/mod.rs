//! Configuration for the mirrored map.
//!
//! All settings carry serde defaults so a mirror can be built from
//! `MirrorConfig::default()` without any external file. `MirrorConfig::load`
//! merges, in priority order:
//! 1. Default values (hardcoded)
//! 2. An optional config file
//! 3. Environment variables prefixed with `MIRROR` (highest priority)

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::constants::DEFAULT_MAP_NAME;
use crate::Result;

#[cfg(test)]
mod config_test;

/// How a local write is coupled to its remote counterpart.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteConcern {
    /// Apply locally, push to the remote store in the background.
    /// Remote failures are logged and never surfaced to the caller.
    #[default]
    LocalOnly,
    /// Apply locally, then await remote confirmation. Remote failures are
    /// returned to the caller; the local mutation is not rolled back.
    LocalThenConfirm,
}

/// How a (previous, next) snapshot pair is turned into cache mutations.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiffStrategy {
    /// Per-key symmetric difference: upsert added/changed keys, remove
    /// vanished keys. Converges for every snapshot pair.
    #[default]
    SymmetricDiff,
    /// Legacy cardinality-based branch selection. Cannot detect a same-size
    /// key replacement; stale keys may linger until the next size change.
    SizeHeuristic,
}

/// Basic retry policy template
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BackoffPolicy {
    /// Maximum number of attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single operation timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_ms: default_op_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MirrorConfig {
    /// Namespace prefix under which all logical keys live remotely
    #[serde(default = "default_map_name")]
    pub map_name: String,

    /// Local-first write coupling
    #[serde(default)]
    pub write_concern: WriteConcern,

    /// Snapshot reconciliation strategy
    #[serde(default)]
    pub diff_strategy: DiffStrategy,

    /// Retry policy for watch registration and post-failure reloads
    #[serde(default)]
    pub watch_backoff: BackoffPolicy,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            map_name: default_map_name(),
            write_concern: WriteConcern::default(),
            diff_strategy: DiffStrategy::default(),
            watch_backoff: BackoffPolicy::default(),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from an optional file path plus `MIRROR_*`
    /// environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("MIRROR").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

fn default_map_name() -> String {
    DEFAULT_MAP_NAME.to_string()
}
fn default_max_retries() -> usize {
    5
}
fn default_op_timeout_ms() -> u64 {
    1000
}
fn default_base_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    5000
}
