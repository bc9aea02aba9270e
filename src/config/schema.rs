// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration, read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub executor: ExecutorConfig,
    pub calendars: CalendarsConfig,
    pub logging: LoggingConfig,
}

/// How AppleScript is run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// `osascript` binary; `~` and `$VARS` are expanded.
    pub osascript_path: String,
    /// Per-invocation timeout.
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            osascript_path: "osascript".into(),
            timeout_secs: 30,
        }
    }
}

impl ExecutorConfig {
    pub fn program(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.osascript_path)
            .with_context(|| format!("Cannot expand osascript_path '{}'", self.osascript_path))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Calendars used when a tool call omits `calendar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarsConfig {
    /// Default for create-event, list-today-events and search-events.
    pub personal: String,
    /// Default for create-batch-events, delete-events-by-keyword and list-week-events.
    pub work: String,
}

impl Default for CalendarsConfig {
    fn default() -> Self {
        Self {
            personal: "Personal".into(),
            work: "Work".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter level: error, warn, info, debug or trace.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Config {
    /// `<config dir>/macos-calendar-mcp/config.toml` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "macos-calendar-mcp")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid TOML in config file")
    }

    /// The file to read: `path` (after `~` expansion) or
    /// [`Config::default_path`]. `None` means run on the defaults.
    ///
    /// An explicit path must exist. A missing file at the default location
    /// is not an error.
    pub fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>> {
        match path {
            Some(p) => {
                let expanded = PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref());
                if !expanded.exists() {
                    anyhow::bail!("Config file not found: {}", expanded.display());
                }
                Ok(Some(expanded))
            }
            None => Ok(Self::default_path().filter(|p| p.exists())),
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// [`Config::resolve_path`] then [`Config::load_file`], or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(path)? {
            Some(file) => Self::load_file(&file),
            None => Ok(Self::default()),
        }
    }
}
