//! Configuration management for podium
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Command-line flags override both in `main.rs`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Category;
use crate::scheduler::{TriggerConfig, DEFAULT_TASK_NAME};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage locations
    pub database: DatabaseConfig,

    /// Ranking and snapshot behaviour
    pub leaderboard: LeaderboardConfig,

    /// HTTP server
    pub server: ServerConfig,

    /// Digest delivery
    pub digest: DigestConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database holding snapshots and the run log
    pub snapshot_path: PathBuf,

    /// SQLite database holding subjects and activity events
    pub activity_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/podium.db"),
            activity_path: PathBuf::from("data/activity.db"),
        }
    }
}

/// Leaderboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Snapshots newer than this are "current" for delta computation
    pub freshness_window_days: i64,

    /// Snapshots newer than this count for badges
    pub badge_window_days: i64,

    /// Run log key
    pub task_name: String,

    /// Compute categories on parallel threads
    pub parallel: bool,

    /// Categories to run; empty means all
    pub categories: Vec<Category>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            freshness_window_days: 7,
            badge_window_days: 7,
            task_name: DEFAULT_TASK_NAME.to_string(),
            parallel: false,
            categories: Vec::new(),
        }
    }
}

impl LeaderboardConfig {
    /// Configured categories, or every category when none are listed
    pub fn active_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            Category::all()
        } else {
            let mut categories = self.categories.clone();
            categories.sort();
            categories.dedup();
            categories
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind: String,

    /// Bearer token for admin endpoints; admin endpoints reject everything
    /// when unset
    pub admin_token: Option<String>,

    /// Daily automatic run
    pub trigger: TriggerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            admin_token: None,
            trigger: TriggerConfig::default(),
        }
    }
}

/// Digest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Delivery pace
    pub subjects_per_second: u32,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            subjects_per_second: crate::digest::DEFAULT_SUBJECTS_PER_SECOND,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let snapshot_path = std::env::var("PODIUM_SNAPSHOT_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.database.snapshot_path);

        let activity_path = std::env::var("PODIUM_ACTIVITY_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.database.activity_path);

        let categories = match std::env::var("PODIUM_CATEGORIES") {
            Ok(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<Category>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Invalid PODIUM_CATEGORIES")?,
            Err(_) => Vec::new(),
        };

        let trigger = TriggerConfig {
            enabled: env_parse("PODIUM_TRIGGER_ENABLED").unwrap_or(defaults.server.trigger.enabled),
            run_time: std::env::var("PODIUM_TRIGGER_TIME")
                .unwrap_or(defaults.server.trigger.run_time),
            run_on_startup: env_parse("PODIUM_TRIGGER_ON_STARTUP")
                .unwrap_or(defaults.server.trigger.run_on_startup),
        };

        Ok(Self {
            database: DatabaseConfig {
                snapshot_path,
                activity_path,
            },
            leaderboard: LeaderboardConfig {
                freshness_window_days: env_parse("PODIUM_FRESHNESS_WINDOW_DAYS")
                    .unwrap_or(defaults.leaderboard.freshness_window_days),
                badge_window_days: env_parse("PODIUM_BADGE_WINDOW_DAYS")
                    .unwrap_or(defaults.leaderboard.badge_window_days),
                task_name: std::env::var("PODIUM_TASK_NAME")
                    .unwrap_or(defaults.leaderboard.task_name),
                parallel: env_parse("PODIUM_PARALLEL").unwrap_or(defaults.leaderboard.parallel),
                categories,
            },
            server: ServerConfig {
                bind: std::env::var("PODIUM_BIND").unwrap_or(defaults.server.bind),
                admin_token: std::env::var("PODIUM_ADMIN_TOKEN")
                    .ok()
                    .filter(|t| !t.is_empty()),
                trigger,
            },
            digest: DigestConfig {
                subjects_per_second: env_parse("PODIUM_DIGEST_RATE")
                    .unwrap_or(defaults.digest.subjects_per_second),
            },
            logging: LoggingConfig {
                level: std::env::var("PODIUM_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: std::env::var("PODIUM_LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.leaderboard.freshness_window_days <= 0 {
            anyhow::bail!("freshness_window_days must be greater than 0");
        }

        if self.leaderboard.badge_window_days <= 0 {
            anyhow::bail!("badge_window_days must be greater than 0");
        }

        if self.leaderboard.task_name.trim().is_empty() {
            anyhow::bail!("task_name must not be empty");
        }

        if self.digest.subjects_per_second == 0 {
            anyhow::bail!("subjects_per_second must be greater than 0");
        }

        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            anyhow::bail!("log level must be one of trace, debug, info, warn, error");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        self.server
            .bind
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))?;

        self.server
            .trigger
            .validate()
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        Ok(())
    }
}
