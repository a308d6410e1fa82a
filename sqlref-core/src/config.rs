//! Configuration discovery and loading
//!
//! Resolution order:
//! 1. `--config` CLI override (must exist)
//! 2. `SQLREF_CONFIG` environment variable (must exist)
//! 3. Platform config directory (`~/.config/sqlref/config.yaml` on Linux)
//! 4. Built-in defaults when no file is found (graceful absence)
//!
//! `SQLREF_DOCUMENT` overrides the configured document path.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::catalog::SearchOptions;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "SQLREF_CONFIG";

/// Environment variable naming the cheat-sheet document
pub const DOCUMENT_ENV: &str = "SQLREF_DOCUMENT";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Result limit when neither the CLI nor the config sets one
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// sqlref configuration (config.yaml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SqlrefConfig {
    /// Cheat-sheet document to load instead of the built-in one
    #[serde(default)]
    pub document: Option<PathBuf>,

    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,

    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Defaults applied to `sqlref search`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub include_examples: bool,
}

impl SqlrefConfig {
    /// Discover and load configuration with an optional CLI override
    pub fn discover(cli_override: Option<&Path>) -> Result<Self> {
        let explicit = cli_override.map(Path::to_path_buf).or_else(|| {
            env::var_os(CONFIG_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file does not exist: {}", path.display());
                }
                Self::load_from_path(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.is_file() => Self::load_from_path(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        if let Some(document) = env::var_os(DOCUMENT_ENV).filter(|value| !value.is_empty()) {
            debug!("Using {} override: {:?}", DOCUMENT_ENV, document);
            config.document = Some(PathBuf::from(document));
        }

        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// A relative `document` path is resolved against the file's directory.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let (Some(document), Some(base)) = (config.document.as_mut(), path.parent()) {
            if document.is_relative() {
                *document = base.join(&*document);
            }
        }

        info!("Loaded configuration from {}", path.display());
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration from YAML; blank input gives the defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content).context("Failed to parse sqlref configuration YAML")
    }

    /// Platform config file location, if a config directory can be determined
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sqlref")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("sqlref")))
            .map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    /// Effective default result limit
    pub fn search_limit(&self) -> usize {
        self.search.limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }

    /// Search options seeded from the configured defaults
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            limit: Some(self.search_limit()),
            topic: None,
            include_examples: self.search.include_examples,
            all_terms: false,
        }
    }
}
