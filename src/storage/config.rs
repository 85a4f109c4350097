//! Configuration handling for pkgorder
//!
//! Configuration is read from `pkgorder.toml` (project, found by walking up
//! from the current directory) and `~/.config/pkgorder/config.toml` (global).
//! An explicit `--config` path replaces the project lookup.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{OrderConfig, PlannerConfig};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "pkgorder.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Ordering engine settings
    pub order: OrderConfig,

    /// Transaction planner settings
    pub planner: PlannerConfig,
}

impl ProjectConfig {
    /// Rejects settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order.max_depth == 0 {
            return Err(ConfigError::Invalid("order.max_depth must be at least 1".into()));
        }
        if self.order.loop_capacity == 0 {
            return Err(ConfigError::Invalid(
                "order.loop_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    /// File the project configuration came from, if any
    pub source: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let source = Self::find_project_config();

        let project = match &source {
            Some(path) => Self::load_project_config(path)?,
            None => ProjectConfig::default(),
        };

        Ok(Self {
            project,
            global,
            source,
        })
    }

    /// Loads the global configuration plus an explicit project file
    pub fn from_file(path: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(path)?;

        Ok(Self {
            project,
            global,
            source: Some(path.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "pkgorder", "pkgorder").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads and validates a project configuration file
    fn load_project_config(config_path: &Path) -> Result<ProjectConfig> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;
        Ok(config)
    }

    /// Finds `pkgorder.toml` in the current directory or one of its parents
    pub fn find_project_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_config_from(&current)
    }

    fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(PROJECT_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
