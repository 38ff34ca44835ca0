//! Configuration management for imgpress.
//!
//! Persistent settings (tool paths, default match rules, logging) load from
//! a TOML file with sensible defaults; per-invocation settings arrive as a
//! [`BatchOptions`] built by the caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Root configuration structure for imgpress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External compression tool settings
    pub tools: ToolsConfig,

    /// Discovery settings
    pub discovery: DiscoveryConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// ~/.imgpress/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "imgpress", "imgpress")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".imgpress").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Paths to the external compression executables.
///
/// Defaults resolve through PATH; a missing binary is a swallowed per-step
/// failure at run time, never a startup error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// PNG lossless optimizer
    pub optipng_path: PathBuf,

    /// PNG lossy palette quantizer
    pub pngquant_path: PathBuf,

    /// JPEG optimizer
    pub jpegoptim_path: PathBuf,

    /// GIF optimizer
    pub gifsicle_path: PathBuf,

    /// Per-step timeout in seconds; 0 disables the timeout.
    /// A timed-out step counts as a swallowed failure.
    pub step_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            optipng_path: PathBuf::from("optipng"),
            pngquant_path: PathBuf::from("pngquant"),
            jpegoptim_path: PathBuf::from("jpegoptim"),
            gifsicle_path: PathBuf::from("gifsicle"),
            step_timeout_secs: 0,
        }
    }
}

/// Discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Default glob rules applied when the caller supplies none
    pub match_rules: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            match_rules: vec![
                "*.jpeg".to_string(),
                "*.jpg".to_string(),
                "*.png".to_string(),
                "*.gif".to_string(),
            ],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("error", "warn", "info", "debug", "trace")
    pub level: String,

    /// Log format ("pretty" or "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Where the batch input came from.
///
/// The distinction is decided once when options are built and drives
/// output-path resolution: a flat file list flattens into the output
/// directory, a directory tree preserves its structure underneath it.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Explicit list of file paths
    FileList(Vec<PathBuf>),

    /// A directory root, traversed recursively
    DirectoryTree(PathBuf),
}

/// Parsed resize spec; either axis may be unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl SizeSpec {
    /// Parse a spec like `800`, `x600`, `800x600` or `800,600`.
    ///
    /// The separator may be `,`, `x` or `X`; a missing or zero token leaves
    /// that axis unconstrained.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let parse_axis = |tok: Option<&str>| -> Result<Option<u32>, ConfigError> {
            match tok {
                Some("") | None => Ok(None),
                Some(tok) => tok
                    .trim()
                    .parse::<u32>()
                    .map(|v| (v > 0).then_some(v))
                    .map_err(|_| ConfigError::InvalidSizeSpec(spec.to_string())),
            }
        };

        let mut tokens = spec.splitn(2, [',', 'x', 'X']);
        let width = parse_axis(tokens.next())?;
        let height = parse_axis(tokens.next())?;

        if width.is_none() && height.is_none() {
            return Err(ConfigError::InvalidSizeSpec(spec.to_string()));
        }
        Ok(Self { width, height })
    }
}

/// Per-invocation batch options supplied by the caller.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Input files or directory root
    pub input: InputSource,

    /// Output directory; `None` means in-place overwrite semantics
    pub output: Option<PathBuf>,

    /// Glob rules a file must match to be processed
    pub match_rules: Vec<String>,

    /// Lossy compression strength 0-100; `None` disables lossy steps
    pub lossy: Option<u8>,

    /// Optional resize constraint applied after the format steps
    pub size: Option<SizeSpec>,
}

impl BatchOptions {
    /// Build options with the config-supplied default match rules.
    pub fn new(input: InputSource, config: &Config) -> Self {
        Self {
            input,
            output: None,
            match_rules: config.discovery.match_rules.clone(),
            lossy: None,
            size: None,
        }
    }

    /// Validate and set the lossy strength.
    ///
    /// Strength 0 disables the lossy steps, same as never asking for them.
    pub fn with_lossy(mut self, lossy: u32) -> Result<Self, ConfigError> {
        if lossy > 100 {
            return Err(ConfigError::InvalidLossy(lossy));
        }
        self.lossy = (lossy > 0).then_some(lossy as u8);
        Ok(self)
    }

    /// Resolve the output directory with `~` expansion.
    pub fn resolved_output(&self) -> Option<PathBuf> {
        self.output.as_ref().map(|p| {
            let raw = p.to_string_lossy().into_owned();
            let expanded = shellexpand::tilde(&raw);
            PathBuf::from(expanded.into_owned())
        })
    }
}
