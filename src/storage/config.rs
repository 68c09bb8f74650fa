//! Configuration handling for taskplan
//!
//! Configuration is stored in `taskplan.toml` (project, found by walking up
//! from the current directory) and `~/.config/taskplan/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{InferenceRule, PlanningContext, Strategy, DEFAULT_MIN_DURATION_HOURS};

/// File name of the project configuration
pub const PROJECT_CONFIG_FILE: &str = "taskplan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Which non-blocking warnings to emit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarningConfig {
    /// Warn about non-setup tasks without dependencies or dependents
    pub isolated_tasks: bool,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            isolated_tasks: true,
        }
    }
}

/// Configuration for the keyword suggestion pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// Run the suggestion pass
    pub enabled: bool,

    /// Keyword rules; the built-in set is used when empty
    pub rules: Vec<InferenceRule>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
        }
    }
}

impl InferenceConfig {
    /// Returns the rules to apply, or `None` when disabled
    pub fn effective_rules(&self) -> Option<Vec<InferenceRule>> {
        if !self.enabled {
            None
        } else if self.rules.is_empty() {
            Some(InferenceRule::defaults())
        } else {
            Some(self.rules.clone())
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Strategy used when `--strategy` is not given
    pub default_strategy: Strategy,

    /// Fallback for missing, negative or non-finite duration estimates
    pub min_duration_hours: f64,

    /// Warning settings
    pub warnings: WarningConfig,

    /// Suggestion pass settings
    pub inference: InferenceConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_strategy: Strategy::Sequential,
            min_duration_hours: DEFAULT_MIN_DURATION_HOURS,
            warnings: WarningConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Checks values that TOML alone cannot constrain
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_duration_hours.is_finite() || self.min_duration_hours < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_duration_hours must be a non-negative number, got {}",
                self.min_duration_hours
            )));
        }
        for rule in &self.inference.rules {
            if rule.keyword.trim().is_empty() || rule.requires.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "inference rules need both 'keyword' and 'requires'".to_string(),
                ));
            }
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
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Builds the context for one planning run
    ///
    /// An explicit strategy overrides the configured default.
    pub fn planning_context(&self, strategy: Option<Strategy>) -> PlanningContext {
        PlanningContext {
            strategy: strategy.unwrap_or(self.project.default_strategy),
            min_duration_hours: self.project.min_duration_hours,
            warn_isolated: self.project.warnings.isolated_tasks,
            suggestions: self.project.inference.effective_rules(),
        }
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "taskplan", "taskplan").map(|dirs| dirs.config_dir().to_path_buf())
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

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for `taskplan.toml`
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(PROJECT_CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if a project config was found
    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Writes a default project config; existing files are left alone
    ///
    /// Returns the config path and whether it was created.
    pub fn init_project(root: &Path) -> Result<(PathBuf, bool)> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create directory: {}", root.display()))?;

        let config_path = root.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Ok((config_path, false));
        }

        let mut config = ProjectConfig::default();
        config.inference.rules = InferenceRule::defaults();
        let body =
            toml::to_string_pretty(&config).context("Failed to serialize project config")?;
        let content = format!(
            "# taskplan project configuration\n\
             # default_strategy: sequential | critical_path | parallelizable\n\n{}",
            body
        );

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))?;

        Ok((config_path, true))
    }
}
