use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::generation::DEFAULT_LIST_LIMIT;
use crate::query::DEFAULT_FUZZY_THRESHOLD;

/// Configuration for the jeannie search engine.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. Environment variables (JEANNIE_* prefix)
/// 2. Config file (~/.config/jeannie/config.toml)
/// 3. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the scanner's catalog JSON.
    ///
    /// Can be set via:
    /// - ENV: JEANNIE_CATALOG_PATH
    /// - Config: catalog_path = "/path/to/content.json"
    /// - Default: ~/.local/share/jeannie/content.json
    pub catalog_path: PathBuf,

    /// Optional curated enrichment, merged into the catalog on every load.
    pub enrichment_path: Option<PathBuf>,

    /// Optional genre/vibe vocabulary replacing the built-in one.
    pub taxonomy_path: Option<PathBuf>,

    /// Fuzzy matches must score strictly above this.
    pub fuzzy_threshold: f64,

    /// Default page size for listings.
    pub list_limit: usize,

    /// Log level: off, error, warn, info, debug or trace.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            enrichment_path: None,
            taxonomy_path: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            list_limit: DEFAULT_LIST_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `config_path` (if it exists) and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("jeannie");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error for a threshold outside 0.0-1.0, a zero list limit,
    /// or an unknown log level.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            anyhow::bail!(
                "fuzzy_threshold must be between 0.0 and 1.0, got {}",
                self.fuzzy_threshold
            );
        }
        if self.list_limit == 0 {
            anyhow::bail!("list_limit must be at least 1");
        }
        self.level_filter()?;
        Ok(())
    }

    /// Parsed `log_level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the level name is unknown.
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        log::LevelFilter::from_str(&self.log_level)
            .with_context(|| format!("Unknown log level '{}'", self.log_level))
    }

    /// Install the logging backend and apply `log_level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the level is unknown or a logger is already set.
    pub fn init_logging(&self) -> Result<()> {
        let level = self.level_filter()?;
        twyg::setup(twyg::Opts::default())
            .map_err(|e| anyhow::anyhow!("Failed to set up logging: {:?}", e))?;
        log::set_max_level(level);
        Ok(())
    }
}

/// Get the default catalog path.
///
/// Returns: ~/.local/share/jeannie/content.json (or platform equivalent)
pub fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jeannie")
        .join("content.json")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/jeannie/config.toml
/// - macOS: ~/Library/Application Support/jeannie/config.toml
/// - Windows: %APPDATA%\jeannie\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jeannie")
        .join("config.toml")
}
