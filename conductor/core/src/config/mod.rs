//! TOML Configuration File Support
//!
//! Centralized configuration loading for codetell, from a TOML file at
//! `~/.config/codetell/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/codetell/config.toml` for configuration
//! - `$XDG_DATA_HOME/codetell/session.json` for the account session token
//!
//! # Example Configuration
//!
//! ```toml
//! [analysis]
//! base_url = "http://localhost:5050"
//! model = "adaboost"
//! timeout_secs = 60
//! machine_threshold = 0.5
//!
//! [intake]
//! allowed_extensions = ["py", "rs", "go"]
//!
//! [account]
//! base_url = "http://localhost:5050"
//!
//! [chat]
//! greeting = "Paste some code."
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{DEFAULT_MACHINE_THRESHOLD, DEFAULT_MODEL};
use crate::controller::{ControllerConfig, DEFAULT_GREETING};
use crate::intake::ExtensionAllowList;

/// Default service URL for analysis and account endpoints
pub const DEFAULT_BASE_URL: &str = "http://localhost:5050";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable names
pub mod env {
    /// Analysis service base URL
    pub const ANALYSIS_URL: &str = "CODETELL_ANALYSIS_URL";
    /// Classifier model name
    pub const MODEL: &str = "CODETELL_MODEL";
    /// Request timeout in seconds
    pub const TIMEOUT_SECS: &str = "CODETELL_TIMEOUT_SECS";
    /// Account service base URL
    pub const ACCOUNT_URL: &str = "CODETELL_ACCOUNT_URL";
    /// Session token file
    pub const TOKEN_PATH: &str = "CODETELL_TOKEN_PATH";
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the highest-priority configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[analysis]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisToml {
    /// Prediction service base URL
    pub base_url: Option<String>,
    /// Classifier model path segment
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Machine probability at or above which the verdict is machine
    pub machine_threshold: Option<f64>,
}

/// `[intake]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeToml {
    /// Accepted upload extensions
    pub allowed_extensions: Option<Vec<String>>,
}

/// `[account]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountToml {
    /// Account service base URL
    pub base_url: Option<String>,
    /// Session token file
    pub token_path: Option<PathBuf>,
}

/// `[chat]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Greeting for new sessions
    pub greeting: Option<String>,
}

/// Root TOML document
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodetellToml {
    /// Analysis settings
    pub analysis: AnalysisToml,
    /// File intake settings
    pub intake: IntakeToml,
    /// Account settings
    pub account: AccountToml,
    /// Chat settings
    pub chat: ChatToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Centralized configuration for codetell
///
/// Use [`load_config`] to load it with proper priority handling.
#[derive(Clone, Debug)]
pub struct CodetellConfig {
    /// Prediction service base URL
    pub analysis_url: String,
    /// Classifier model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Verdict threshold for responses without an explicit prediction
    pub machine_threshold: f64,
    /// Accepted upload extensions
    pub allowed_extensions: ExtensionAllowList,
    /// Account service base URL
    pub account_url: String,
    /// Session token file, if one could be determined
    pub token_path: Option<PathBuf>,
    /// Greeting for new sessions
    pub greeting: String,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for CodetellConfig {
    fn default() -> Self {
        Self {
            analysis_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            machine_threshold: DEFAULT_MACHINE_THRESHOLD,
            allowed_extensions: ExtensionAllowList::default(),
            account_url: DEFAULT_BASE_URL.to_string(),
            token_path: default_token_path(),
            greeting: DEFAULT_GREETING.to_string(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl CodetellConfig {
    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Controller settings derived from this configuration
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            greeting: self.greeting.clone(),
            allow_list: self.allowed_extensions.clone(),
        }
    }

    /// Check value constraints
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_model_name(&self.model)?;

        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "analysis timeout must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.machine_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "machine_threshold must be within [0, 1], got {}",
                self.machine_threshold
            )));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "allowed_extensions must not be empty".to_string(),
            ));
        }
        for (name, url) in [("analysis", &self.analysis_url), ("account", &self.account_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} base_url must be an http(s) URL, got {url:?}"
                )));
            }
        }
        Ok(())
    }
}

fn validate_model_name(model: &str) -> Result<(), ConfigError> {
    if model.is_empty() {
        return Err(ConfigError::ValidationError("model must not be empty".to_string()));
    }
    let url_safe = model
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !url_safe {
        return Err(ConfigError::ValidationError(format!(
            "model {model:?} may only contain ASCII letters, digits, '-', '_' and '.'"
        )));
    }
    Ok(())
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/codetell/config.toml` or
/// `~/.config/codetell/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("codetell").join("config.toml"))
}

/// Get the default session token path
#[must_use]
pub fn default_token_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("codetell").join("session.json"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] after.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed,
/// or if the result fails validation. A missing config file is not an error.
pub fn load_config() -> Result<CodetellConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// If `path` is `None`, only defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<CodetellConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration reading environment values through `lookup`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(
    path: Option<PathBuf>,
    lookup: F,
) -> Result<CodetellConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = CodetellConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: CodetellToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, lookup);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut CodetellConfig, toml: &CodetellToml) {
    if let Some(ref url) = toml.analysis.base_url {
        config.analysis_url = url.clone();
    }
    if let Some(ref model) = toml.analysis.model {
        config.model = model.clone();
    }
    if let Some(secs) = toml.analysis.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(threshold) = toml.analysis.machine_threshold {
        config.machine_threshold = threshold;
    }

    if let Some(ref extensions) = toml.intake.allowed_extensions {
        config.allowed_extensions = ExtensionAllowList::new(extensions);
    }

    if let Some(ref url) = toml.account.base_url {
        config.account_url = url.clone();
    }
    if toml.account.token_path.is_some() {
        config.token_path = toml.account.token_path.clone();
    }

    if let Some(ref greeting) = toml.chat.greeting {
        config.greeting = greeting.clone();
    }
}

fn apply_env_config<F>(config: &mut CodetellConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(env::ANALYSIS_URL) {
        config.analysis_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(model) = lookup(env::MODEL) {
        config.model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = lookup(env::TIMEOUT_SECS) {
        match secs.parse::<u64>() {
            Ok(secs) => {
                config.timeout = Duration::from_secs(secs);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %secs, "Ignoring unparsable {}", env::TIMEOUT_SECS),
        }
    }
    if let Some(url) = lookup(env::ACCOUNT_URL) {
        config.account_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = lookup(env::TOKEN_PATH) {
        config.token_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Configuration overrides from command-line arguments
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Analysis service URL override
    pub analysis_url: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Account service URL override
    pub account_url: Option<String>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set analysis URL override
    #[must_use]
    pub fn with_analysis_url(mut self, url: String) -> Self {
        self.analysis_url = Some(url);
        self
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set account URL override
    #[must_use]
    pub fn with_account_url(mut self, url: String) -> Self {
        self.account_url = Some(url);
        self
    }

    /// Apply overrides to a configuration and re-validate it
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override is invalid.
    pub fn apply(&self, config: &mut CodetellConfig) -> Result<(), ConfigError> {
        if self.analysis_url.is_some() || self.model.is_some() || self.account_url.is_some() {
            config.source = ConfigSource::Cli;
        }
        if let Some(ref url) = self.analysis_url {
            config.analysis_url = url.clone();
        }
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(ref url) = self.account_url {
            config.account_url = url.clone();
        }
        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
