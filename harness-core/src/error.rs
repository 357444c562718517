//! Error types with clear, actionable messages
//!
//! Policy violations are not errors: a blocked command is an ordinary
//! [`Decision::Block`](crate::decision::Decision). These variants cover the
//! cases where the engine itself cannot do its job.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// A configuration file exists but is not valid JSON
    #[error("Failed to parse {path}: {source}\n\nFix the JSON syntax in this file, then run:\n  harness config validate")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration file exists but could not be read
    #[error("Failed to read {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The required harness configuration file is missing
    #[error("Configuration file not found: {0}\n\nCreate harness.config.json at the project root with `version`, `safeMode` and `restrictions`.")]
    ConfigMissing(PathBuf),

    /// The activation log could not be appended to
    #[error("Failed to append to activation log {path}")]
    ActivationLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HarnessError>;
