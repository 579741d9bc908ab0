//! TOML-based configuration for the team mention filter.
//!
//! ```toml
//! [filter]
//! base_url = "https://github.example.com/"
//! render = "link"
//! ignored_ancestors = ["pre", "code", "a"]
//!
//! [directory]
//! database = "/var/lib/team-mentions/directory.db"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section is optional; an empty file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::mention::RenderStyle;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Mention rendering and traversal settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Where organizations and teams are looked up.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Options for one mention filter pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Base URL for team links (default `/`). Only the `link` style uses it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Markup used for resolved mentions.
    #[serde(default)]
    pub render: RenderStyle,

    /// Element names whose descendants are never rewritten.
    #[serde(default = "default_ignored_ancestors")]
    pub ignored_ancestors: Vec<String>,
}

fn default_base_url() -> String {
    "/".into()
}
fn default_ignored_ancestors() -> Vec<String> {
    vec!["pre".into(), "code".into(), "a".into()]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            render: RenderStyle::default(),
            ignored_ancestors: default_ignored_ancestors(),
        }
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Identity store selection. At most one source may be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// TOML directory file loaded into memory.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// SQLite directory database.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level or `EnvFilter` directive (default `warn`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "filter.base_url".into(),
                detail: "base URL must not be empty".into(),
            });
        }
        for tag in &self.filter.ignored_ancestors {
            let valid = !tag.is_empty()
                && tag.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
            if !valid {
                return Err(ConfigError::InvalidValue {
                    field: "filter.ignored_ancestors".into(),
                    detail: format!("'{}' is not an element name", tag),
                });
            }
        }
        if self.directory.file.is_some() && self.directory.database.is_some() {
            return Err(ConfigError::InvalidValue {
                field: "directory".into(),
                detail: "set either 'file' or 'database', not both".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}
