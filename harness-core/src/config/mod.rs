//! Configuration model: harness behavior, architecture rules, skill catalog
//!
//! All three files are JSON and all three are optional at evaluation time.
//! Loading never fails the calling evaluation: missing files yield defaults
//! and malformed files degrade to defaults with a warning. Only the explicit
//! `config validate` path treats a broken harness config as a hard error.

pub mod harness;
pub mod rules;
pub mod skills;
pub mod validation;

pub use harness::{HarnessConfig, Restrictions};
pub use rules::{ArchRules, Exceptions, Layers, ProtectedPaths};
pub use skills::{Enforcement, Priority, PromptTriggers, SkillCatalog, SkillDefinition, SkillKind};
pub use validation::{Severity, ValidationIssue, ValidationReport};

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::trace;

use crate::error::{HarnessError, Result};

/// Where a loaded configuration value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Parsed from the file on disk
    File,
    /// The file does not exist; built-in defaults apply
    Defaults,
    /// The file exists but could not be used; built-in defaults apply
    Malformed,
}

impl ConfigSource {
    /// True when built-in defaults are in effect for any reason
    pub fn is_fallback(self) -> bool {
        self != ConfigSource::File
    }
}

/// A configuration value together with the issues found while loading it
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub report: ValidationReport,
    pub source: ConfigSource,
}

/// Read and parse a JSON file; `Ok(None)` when it does not exist
pub(crate) fn read_json(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    trace!("Read {} bytes from {:?}", content.len(), path);

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
}
