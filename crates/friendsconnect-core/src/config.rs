use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{self, env};
use crate::models::UserId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub owner_id: UserId,
    pub ledger_capacity: usize,
    pub poll_interval_secs: u64,
    /// Chance per polling tick that a synthetic notification is injected
    pub fire_probability: f64,
    /// Simulated latency of the polling "fetch" before a tick decides anything
    pub fetch_latency_ms: u64,
    pub toast_duration_ms: u64,
    /// Seed for the random sources. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            owner_id: constants::DEFAULT_OWNER_ID,
            ledger_capacity: constants::LEDGER_CAPACITY,
            poll_interval_secs: constants::DEFAULT_POLL_INTERVAL_SECS,
            fire_probability: constants::DEFAULT_FIRE_PROBABILITY,
            fetch_latency_ms: 0,
            toast_duration_ms: constants::DEFAULT_TOAST_DURATION_MS,
            seed: None,
        }
    }

    /// Platform data directory, falling back to a relative directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|dir| dir.join("friendsconnect"))
            .unwrap_or_else(|| PathBuf::from("friendsconnect_data"))
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `FRIENDSCONNECT_*` environment overrides. Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(env::DATA_DIR) {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if let Some(secs) = read_env_parsed::<u64>(env::POLL_SECS) {
            self.poll_interval_secs = secs;
        }
        if let Some(seed) = read_env_parsed::<u64>(env::SEED) {
            self.seed = Some(seed);
        }
        self
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn fetch_latency(&self) -> Duration {
        Duration::from_millis(self.fetch_latency_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn fire_probability(&self) -> f64 {
        self.fire_probability.clamp(0.0, 1.0)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(Self::default_data_dir())
    }
}

fn read_env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}
