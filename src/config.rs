//! Configuration loader: defaults, optional TOML file, then environment
//!
//! The file lives at the platform config dir (`~/.config/rscn/config.toml` on
//! Linux) unless a path is given explicitly. Environment variables override
//! the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::cache::FreshnessPolicy;
use crate::data::wordpress::DEFAULT_API_URL;

/// Environment variable for the API root
pub const ENV_API_URL: &str = "WORDPRESS_API_URL";
/// Environment variable for the fresh window in seconds
pub const ENV_FRESH_TTL: &str = "CONTENT_FRESH_TTL_SECS";
/// Environment variable for the stale window in seconds
pub const ENV_STALE_TTL: &str = "CONTENT_STALE_TTL_SECS";
/// Environment variable for the request timeout in seconds
pub const ENV_TIMEOUT: &str = "CONTENT_TIMEOUT_SECS";

/// Error types for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An environment variable holds an unusable value
    #[error("{name} must be a whole number of seconds, got '{value}'")]
    Env { name: &'static str, value: String },

    /// The merged configuration is inconsistent
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Runtime configuration for the content gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the WordPress REST API (e.g. `https://host/wp-json/wp/v2`)
    pub api_url: String,
    /// Age below which cached content is served without contacting the API
    pub fresh_ttl_secs: u64,
    /// Age below which stale content is still served while refreshing
    pub stale_ttl_secs: u64,
    /// Per-request timeout for the API
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            fresh_ttl_secs: 600,
            stale_ttl_secs: 1800,
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Loads configuration from the file (if any) and the process environment
    ///
    /// With `path == None` the default config location is tried and silently
    /// skipped when missing. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides fields from environment variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_FRESH_TTL) {
            self.fresh_ttl_secs = parse_secs(ENV_FRESH_TTL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STALE_TTL) {
            self.stale_ttl_secs = parse_secs(ENV_STALE_TTL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.request_timeout_secs = parse_secs(ENV_TIMEOUT, &raw)?;
        }
        Ok(())
    }

    /// Checks the merged values, reporting every problem at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues: Vec<String> = Vec::new();

        if self.api_url.trim().is_empty() {
            issues.push("api_url must not be empty".into());
        } else if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            issues.push(format!(
                "api_url must start with http:// or https://, got '{}'",
                self.api_url
            ));
        }
        if self.fresh_ttl_secs == 0 {
            issues.push("fresh_ttl_secs must be > 0".into());
        }
        if self.stale_ttl_secs <= self.fresh_ttl_secs {
            issues.push("stale_ttl_secs must be greater than fresh_ttl_secs".into());
        }
        if self.request_timeout_secs == 0 {
            issues.push("request_timeout_secs must be > 0".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    /// Freshness windows for the cache
    pub fn policy(&self) -> Result<FreshnessPolicy, ConfigError> {
        FreshnessPolicy::from_secs(self.fresh_ttl_secs, self.stale_ttl_secs)
            .map_err(|err| ConfigError::Invalid(vec![err.to_string()]))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Default config file location, if a home directory can be determined
pub fn default_config_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "rscn")?;
    Some(project_dirs.config_dir().join("config.toml"))
}

fn parse_secs(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| ConfigError::Env {
        name,
        value: raw.to_string(),
    })
}
