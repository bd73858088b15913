// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_CONCURRENCY, MIN_CONCURRENCY};
use crate::errors::{ConfigError, FailurePolicy};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scheduler configuration.
///
/// Every field is optional; an empty file, or `SchedulerConfig::default()`,
/// gives a drain-on-failure scheduler sized to the machine.
///
/// # Fields
/// * `max_concurrency` - Worker pool size, clamped to `[1, available_parallelism]`
/// * `failure_policy` - What happens to in-flight steps after a failure (defaults to `drain`)
/// * `step_timeout_seconds` - Per-step deadline in seconds, fractions allowed; expiry fails the step
/// * `graph_output` - Write the build graph as Graphviz DOT to this path on `build()`
///
/// # Example
/// ```yaml
/// max_concurrency: 4
/// failure_policy: abort
/// step_timeout_seconds: 30
/// graph_output: target/build-graph.dot
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub max_concurrency: Option<usize>,
    pub failure_policy: FailurePolicy,
    #[serde(rename = "step_timeout_seconds", deserialize_with = "deserialize_seconds")]
    pub step_timeout: Option<Duration>,
    pub graph_output: Option<PathBuf>,
}

impl SchedulerConfig {
    /// Number of steps allowed to run at once
    pub fn effective_concurrency(&self) -> usize {
        let available = available_concurrency();
        self.max_concurrency
            .unwrap_or(available)
            .clamp(MIN_CONCURRENCY, available)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn with_graph_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph_output = Some(path.into());
        self
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|seconds| Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parallelism the host offers, falling back to a fixed default
pub fn available_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_CONCURRENCY)
}

/// Load scheduler configuration from a YAML or TOML file, chosen by extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            let content = read(path)?;
            // An empty YAML document deserializes as unit, not as an empty map
            if content.trim().is_empty() {
                return Ok(SchedulerConfig::default());
            }
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("toml") => {
            let content = read(path)?;
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
