//! fieldcheck common library
//!
//! Field specifications, verdicts and page configuration shared by the
//! validation engine and the CLI.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigFormat, PageConfig, PageSettings};
pub use error::{Error, Result};
pub use types::*;

/// fieldcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
