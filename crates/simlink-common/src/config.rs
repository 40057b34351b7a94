//! ---
//! simlink_section: "01-core-functionality"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "TOML configuration for SimLink binaries."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

/// Protocol version a default configuration advertises.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.0.0";

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_owned()
}

fn default_server_name() -> String {
    "simlink".to_owned()
}

fn default_tick_rate_hz() -> f64 {
    60.0
}

fn default_include_excerpt() -> bool {
    true
}

fn default_excerpt_chars() -> usize {
    120
}

/// Top-level configuration shared by SimLink binaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimlinkConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Metadata describing where a [`SimlinkConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedSimlinkConfig {
    pub config: SimlinkConfig,
    pub source: PathBuf,
}

impl SimlinkConfig {
    pub const ENV_CONFIG_PATH: &str = "SIMLINK_CONFIG";

    /// Load configuration from disk, respecting the `SIMLINK_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedSimlinkConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedSimlinkConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedSimlinkConfig {
                    config,
                    source: path.to_path_buf(),
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Like [`load`](Self::load), but falls back to defaults when no file exists.
    /// A file that exists and fails to parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        let env_set = std::env::var(Self::ENV_CONFIG_PATH)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if env_set || candidates.iter().any(|c| c.as_ref().exists()) {
            return Self::load(candidates);
        }
        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<SimlinkConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.protocol.validate()?;
        self.diagnostics.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for SimlinkConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: SimlinkConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Also write JSON logs to a daily rolling file under `directory`.
    #[serde(default)]
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            file_output: false,
        }
    }
}

/// How a server answers handshakes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "default_protocol_version")]
    pub version: String,
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: f64,
    #[serde(default)]
    pub capabilities: IndexMap<String, bool>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            version: default_protocol_version(),
            server_name: default_server_name(),
            tick_rate_hz: default_tick_rate_hz(),
            capabilities: IndexMap::new(),
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        semver::Version::parse(&self.version).with_context(|| {
            format!(
                "protocol.version '{}' is not a semantic version",
                self.version
            )
        })?;
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(anyhow!(
                "protocol.tick_rate_hz must be positive, got {}",
                self.tick_rate_hz
            ));
        }
        Ok(())
    }
}

/// Controls the payload excerpt attached to parse diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_include_excerpt")]
    pub include_excerpt: bool,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            include_excerpt: default_include_excerpt(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

impl DiagnosticsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.excerpt_chars == 0 {
            return Err(anyhow!("diagnostics.excerpt_chars must be greater than zero"));
        }
        Ok(())
    }
}
