//! Error types for the imgpress pipeline.
//!
//! Almost nothing inside a running batch is fatal: step failures, missing
//! tools, and unreadable inputs are logged and swallowed so that one bad
//! image never aborts the rest. The errors here cover the parts that *are*
//! fatal — configuration loading and batch setup.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imgpress operations.
#[derive(Error, Debug)]
pub enum ImgpressError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Batch setup errors (output directory creation etc.)
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A resize spec like "800x600" could not be parsed
    #[error("Invalid size spec '{0}': expected WIDTH, xHEIGHT or WIDTHxHEIGHT")]
    InvalidSizeSpec(String),

    /// Lossy strength must stay within 0-100
    #[error("Invalid lossy strength {0}: must be between 0 and 100")]
    InvalidLossy(u32),
}

/// Errors raised while setting up or tearing down a batch.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The configured output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A per-file pipeline task panicked or was cancelled
    #[error("Pipeline task failed: {0}")]
    TaskJoin(String),
}

/// Convenience type alias for imgpress results.
pub type Result<T> = std::result::Result<T, ImgpressError>;
