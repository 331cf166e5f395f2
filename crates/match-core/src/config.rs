//! Configuration management
//!
//! Settings are resolved in the following order:
//! 1. Environment variables (`MATCH_*`)
//! 2. `match-server.toml` configuration file
//! 3. Defaults

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Main configuration for the matchmaking service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Port for the HTTP endpoint
    #[serde(default = "default_port")]
    pub port: u16,

    /// Session lease duration in seconds; a ping resets it
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,

    /// Upper bound on rows returned by a list query
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: default_port(),
            session_ttl_secs: default_session_ttl_secs(),
            max_results: default_max_results(),
        }
    }
}

fn default_db_path() -> String {
    "data/match-server.db".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_session_ttl_secs() -> i64 {
    30
}

fn default_max_results() -> usize {
    15
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Build configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from the default path.
    ///
    /// Tries `./match-server.toml` first, otherwise falls back to
    /// environment variables and defaults.
    pub fn load() -> Result<Self> {
        if Path::new("match-server.toml").exists() {
            return Self::from_toml_file("match-server.toml");
        }

        Self::from_env()
    }

    /// Environment variables take precedence over the file.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(db_path) = std::env::var("MATCH_DB_PATH") {
            self.db_path = db_path;
        }
        if let Ok(port) = std::env::var("MATCH_PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid MATCH_PORT: {}", port)))?;
        }
        if let Ok(ttl) = std::env::var("MATCH_SESSION_TTL") {
            self.session_ttl_secs = ttl
                .parse()
                .map_err(|_| Error::Config(format!("Invalid MATCH_SESSION_TTL: {}", ttl)))?;
        }
        if let Ok(max) = std::env::var("MATCH_MAX_RESULTS") {
            self.max_results = max
                .parse()
                .map_err(|_| Error::Config(format!("Invalid MATCH_MAX_RESULTS: {}", max)))?;
        }
        Ok(())
    }
}
