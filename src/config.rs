//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/casemap/casemap.toml`
//! 3. Local config: `<dir>/.casemap.toml` (working directory by default)
//! 4. Environment variables: `CASEMAP_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::format::DEFAULT_UTC_OFFSET_MINUTES;
use crate::domain::{DomainError, Limits, ZhCnFormat};

/// Output encoding of a mind-map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Compact widget JSON
    Json,
    /// Indented widget JSON
    #[default]
    Pretty,
    /// Terminal tree
    Tree,
}

impl OutputFormat {
    /// File extension for files written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::Pretty => "json",
            OutputFormat::Tree => "txt",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "tree" => Some(Self::Tree),
            _ => None,
        }
    }
}

/// Date and number display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Offset from UTC used for displaying timestamps, in minutes
    pub utc_offset_minutes: i32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct OutputSettings {
    /// Default output format
    pub format: OutputFormat,
    /// Tree format: hide children of collapsed nodes
    pub respect_collapse: bool,
    /// Default output directory for batch conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Raw limits for intermediate parsing (every cap optional).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLimits {
    pub asset_distribution: Option<usize>,
    pub network_distribution: Option<usize>,
    pub login_ips: Option<usize>,
    pub records_per_ip: Option<usize>,
    pub devices: Option<usize>,
    pub extra_fields: Option<usize>,
}

/// Raw display settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplaySettings {
    pub utc_offset_minutes: Option<i32>,
}

/// Raw output settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputSettings {
    pub format: Option<OutputFormat>,
    pub respect_collapse: Option<bool>,
    pub dir: Option<PathBuf>,
}

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified, inherit from the layer below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub display: RawDisplaySettings,
    pub limits: RawLimits,
    pub output: RawOutputSettings,
}

/// Unified configuration for casemap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Date and number display
    pub display: DisplaySettings,
    /// Truncation caps
    pub limits: Limits,
    /// Output defaults
    pub output: OutputSettings,
}

/// Get the XDG config directory for casemap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "casemap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("casemap.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".casemap.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ApplicationResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay a config layer: specified values win, everything else is kept.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        let limits = &overlay.limits;
        Self {
            display: DisplaySettings {
                utc_offset_minutes: overlay
                    .display
                    .utc_offset_minutes
                    .unwrap_or(self.display.utc_offset_minutes),
            },
            limits: Limits {
                asset_distribution: limits
                    .asset_distribution
                    .unwrap_or(self.limits.asset_distribution),
                network_distribution: limits
                    .network_distribution
                    .unwrap_or(self.limits.network_distribution),
                login_ips: limits.login_ips.unwrap_or(self.limits.login_ips),
                records_per_ip: limits.records_per_ip.unwrap_or(self.limits.records_per_ip),
                devices: limits.devices.unwrap_or(self.limits.devices),
                extra_fields: limits.extra_fields.unwrap_or(self.limits.extra_fields),
            },
            output: OutputSettings {
                format: overlay.output.format.unwrap_or(self.output.format),
                respect_collapse: overlay
                    .output
                    .respect_collapse
                    .unwrap_or(self.output.respect_collapse),
                dir: overlay
                    .output
                    .dir
                    .clone()
                    .or_else(|| self.output.dir.clone()),
            },
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        if let Some(dir) = &self.output.dir {
            let raw = dir.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.output.dir = Some(PathBuf::from(expanded));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.casemap.toml`
    pub fn load(local_dir: Option<&Path>) -> ApplicationResult<Self> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply CASEMAP_* environment variables as explicit overrides.
    ///
    /// Nested keys use `__`, e.g. `CASEMAP_LIMITS__DEVICES=50`.
    fn apply_env_overrides(mut settings: Self) -> ApplicationResult<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("CASEMAP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_int("display.utc_offset_minutes") {
            settings.display.utc_offset_minutes =
                i32::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("display.utc_offset_minutes out of range: {}", val),
                })?;
        }
        if let Ok(val) = config.get_string("output.format") {
            settings.output.format =
                OutputFormat::parse(&val).ok_or_else(|| ApplicationError::Config {
                    message: format!("unknown output.format: {}", val),
                })?;
        }
        if let Ok(val) = config.get_bool("output.respect_collapse") {
            settings.output.respect_collapse = val;
        }
        if let Ok(val) = config.get_string("output.dir") {
            settings.output.dir = Some(PathBuf::from(val));
        }

        let caps: [(&str, &mut usize); 6] = [
            ("limits.asset_distribution", &mut settings.limits.asset_distribution),
            ("limits.network_distribution", &mut settings.limits.network_distribution),
            ("limits.login_ips", &mut settings.limits.login_ips),
            ("limits.records_per_ip", &mut settings.limits.records_per_ip),
            ("limits.devices", &mut settings.limits.devices),
            ("limits.extra_fields", &mut settings.limits.extra_fields),
        ];
        for (key, slot) in caps {
            if let Ok(val) = config.get_int(key) {
                *slot = usize::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("{} must not be negative: {}", key, val),
                })?;
            }
        }

        Ok(settings)
    }

    fn validate(&self) -> ApplicationResult<()> {
        self.display_format().map(|_| ())
    }

    /// Display policy described by these settings.
    pub fn display_format(&self) -> ApplicationResult<ZhCnFormat> {
        let minutes = self.display.utc_offset_minutes;
        ZhCnFormat::with_offset_minutes(minutes)
            .ok_or_else(|| DomainError::InvalidUtcOffset(minutes).into())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# casemap configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/casemap/casemap.toml
#   Local:  ./.casemap.toml
#   Env:    CASEMAP_* environment variables, e.g. CASEMAP_LIMITS__DEVICES=50

[display]
# Offset from UTC for displayed timestamps (minutes); naive timestamps
# in the input are taken to be in this offset already
# utc_offset_minutes = 480

[limits]
# asset_distribution = 10
# network_distribution = 5
# login_ips = 10
# records_per_ip = 5
# devices = 20
# extra_fields = 5

[output]
# json | pretty | tree
# format = "pretty"

# Tree format: hide children of collapsed nodes
# respect_collapse = false

# Default output directory for batch conversion
# dir = "~/casemap-out"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
