//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.quill/config.toml` unless `--config` points elsewhere.
//! If the default file is missing on first run, a commented-out default is
//! generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::client::DEFAULT_BASE_URL;
use crate::core::reveal::{Granularity, RevealConfig};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default)]
    pub widget: WidgetConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RevealSettings {
    pub cursor_speed_ms: Option<u64>,
    pub accumulate_speed_ms: Option<u64>,
    pub granularity: Option<Granularity>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WidgetConfig {
    pub greeting: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_GREETING: &str = "Hi there! What can I help you with?";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub greeting: String,
    pub reveal: RevealConfig,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.quill/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".quill").join("config.toml"))
}

/// Load config from `~/.quill/config.toml`, generating a commented default if
/// it does not exist yet.
pub fn load_config() -> Result<QuillConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(QuillConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(QuillConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. A missing file is an error here.
pub fn load_config_from(path: &Path) -> Result<QuillConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: QuillConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Quill Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# base_url = "http://127.0.0.1:5000"   # Or set QUILL_BASE_URL env var

# [reveal]
# cursor_speed_ms = 20                 # Greeting (cursor mode), per step
# accumulate_speed_ms = 50             # Replies, per step
# granularity = "char"                 # "char" or "line"

# [widget]
# greeting = "Hi there! What can I help you with?"   # Or QUILL_GREETING
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(
    config: &QuillConfig,
    cli_base_url: Option<&str>,
    cli_greeting: Option<&str>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli_base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("QUILL_BASE_URL").ok())
        .or_else(|| config.backend.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Greeting: CLI → env → config → default
    let greeting = cli_greeting
        .map(|s| s.to_string())
        .or_else(|| std::env::var("QUILL_GREETING").ok())
        .or_else(|| config.widget.greeting.clone())
        .unwrap_or_else(|| DEFAULT_GREETING.to_string());

    let defaults = RevealConfig::default();
    let reveal = RevealConfig {
        cursor_speed: config
            .reveal
            .cursor_speed_ms
            .map_or(defaults.cursor_speed, Duration::from_millis),
        accumulate_speed: config
            .reveal
            .accumulate_speed_ms
            .map_or(defaults.accumulate_speed, Duration::from_millis),
        granularity: config.reveal.granularity.unwrap_or(defaults.granularity),
    };

    ResolvedConfig {
        base_url,
        greeting,
        reveal,
    }
}
