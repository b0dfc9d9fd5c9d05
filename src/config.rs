//! Configuration file handling.
//!
//! Settings come from an optional `waitlist.toml`; `CSC_API_KEY` overrides
//! the location API key.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::DEFAULT_LEADERBOARD_SIZE;
use crate::progress::{Goal, DEFAULT_GOAL};

pub const DEFAULT_CONFIG_PATH: &str = "waitlist.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub waitlist: WaitlistConfig,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistConfig {
    /// Signups a city needs to unlock.
    #[serde(default = "default_goal")]
    pub goal: u64,

    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    /// Seconds between refreshes in `watch`.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            leaderboard_size: default_leaderboard_size(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl WaitlistConfig {
    /// The configured goal, or the default one when the file holds zero.
    pub fn goal(&self) -> Goal {
        Goal::new(self.goal).unwrap_or_else(|| {
            warn!("goal must be positive, using {DEFAULT_GOAL}");
            Goal::default()
        })
    }
}

fn default_goal() -> u64 {
    DEFAULT_GOAL
}

fn default_leaderboard_size() -> usize {
    DEFAULT_LEADERBOARD_SIZE
}

fn default_refresh_interval() -> u64 {
    30
}

/// Optional dashboard capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_true")]
    pub city_progress: bool,

    #[serde(default = "default_true")]
    pub leaderboard: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            city_progress: true,
            leaderboard: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_location_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// ISO2 code preselected in the country list.
    #[serde(default = "default_country")]
    pub default_country: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            base_url: default_location_url(),
            api_key: String::new(),
            default_country: default_country(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_location_url() -> String {
    "https://api.countrystatecity.in/v1".to_string()
}

fn default_country() -> String {
    "PK".to_string()
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads `path` when given, otherwise `waitlist.toml` if present, otherwise
    /// defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(key) = std::env::var("CSC_API_KEY") {
            config.location.api_key = key;
        }

        Ok(config)
    }
}
