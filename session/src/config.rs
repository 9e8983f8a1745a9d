//! Engine configuration.
//!
//! Loaded from TOML, then environment overrides, then validation:
//!
//! ```toml
//! [database]
//! path = "opbatch.db"
//! busy_timeout_ms = 5000
//! foreign_keys = true
//!
//! [execution]
//! empty_dependency = "skip"
//! max_operations = 1000
//!
//! [logging]
//! level = "info"
//! ```

use opbatch_resolver::EmptyDependencyPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("opbatch.db"),
            busy_timeout_ms: 5000,
            foreign_keys: true,
        }
    }
}

/// `[execution]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub empty_dependency: EmptyDependencyPolicy,
    pub max_operations: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            empty_dependency: EmptyDependencyPolicy::Skip,
            max_operations: 1000,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment overrides are applied separately via `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `OPBATCH_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(path) = lookup("OPBATCH_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(policy) = lookup("OPBATCH_EMPTY_DEPENDENCY") {
            self.execution.empty_dependency = policy.parse().map_err(ConfigError::invalid)?;
        }
        if let Some(level) = lookup("OPBATCH_LOG_LEVEL") {
            self.logging.level = level.trim().to_ascii_lowercase();
        }
        Ok(())
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("database.path cannot be empty"));
        }

        if self.execution.max_operations == 0 {
            return Err(ConfigError::invalid("execution.max_operations cannot be 0"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
