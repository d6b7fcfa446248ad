//! Error types for fieldcheck
//!
//! Only configuration-level problems are errors. Anything that goes wrong
//! while checking a live page is reported through a failing [`crate::Verdict`].

use thiserror::Error;

/// Result type alias using fieldcheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// fieldcheck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown field type at index {index}: {raw:?}")]
    UnknownFieldKind { index: usize, raw: String },

    #[error("Field already registered: {0}")]
    DuplicateField(String),
}
