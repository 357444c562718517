//! Architecture rules (`architecture/rules.json`)
//!
//! The rules decide which paths are protected. They must never be weaker
//! than the built-in defaults just because the file is missing or broken, so
//! every failure mode ends in [`ArchRules::default`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use super::validation::ValidationReport;
use super::{read_json, ConfigSource, Loaded};

/// Core zones protected when no rules say otherwise
pub const DEFAULT_PROTECTED_PATHS: &[&str] =
    &["harness/", "hooks/", "architecture/", ".claude/", "CLAUDE.md"];

/// Dependency order of source layers, innermost first
pub const DEFAULT_LAYER_ORDER: &[&str] = &["types", "config", "repo", "service", "runtime", "ui"];

pub const DEFAULT_PROTECTION_MESSAGE: &str =
    "This path is part of the protected harness core.";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchRules {
    pub layers: Layers,
    pub protected_paths: ProtectedPaths,
    pub exceptions: Exceptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layers {
    pub order: Vec<String>,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectedPaths {
    /// Ordered prefixes; the first match wins
    pub paths: Vec<String>,
    pub enforcement: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Exceptions {
    /// Paths inside protected zones that may be edited anyway
    pub allowed_core_edits: Vec<String>,
    /// Layer imports allowed against the order, as `from->to`
    pub allowed_cross_layer: Vec<String>,
    /// Any other exception lists, preserved but unused
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            order: DEFAULT_LAYER_ORDER.iter().map(|s| s.to_string()).collect(),
            direction: "forward".to_string(),
        }
    }
}

impl Default for ProtectedPaths {
    fn default() -> Self {
        Self {
            paths: DEFAULT_PROTECTED_PATHS.iter().map(|s| s.to_string()).collect(),
            enforcement: "block".to_string(),
            message: DEFAULT_PROTECTION_MESSAGE.to_string(),
        }
    }
}

impl ArchRules {
    /// Build rules from a parsed document, filling empty sections with defaults
    pub fn from_value(value: Value) -> (ArchRules, ValidationReport) {
        let mut report = ValidationReport::new();

        let mut rules: ArchRules = match serde_json::from_value(value) {
            Ok(rules) => rules,
            Err(e) => {
                report.error("rules", format!("Rules do not match the expected shape: {e}"));
                return (ArchRules::default(), report);
            }
        };

        if rules.protected_paths.paths.is_empty() {
            report.warning(
                "protected_paths.paths",
                "No protected paths configured, using the built-in core zones",
            );
            rules.protected_paths.paths = ProtectedPaths::default().paths;
        }
        if rules.protected_paths.message.trim().is_empty() {
            rules.protected_paths.message = DEFAULT_PROTECTION_MESSAGE.to_string();
        }
        if rules.protected_paths.enforcement.trim().is_empty() {
            rules.protected_paths.enforcement = "block".to_string();
        }
        if rules.layers.order.is_empty() {
            rules.layers.order = Layers::default().order;
        }

        for key in rules.exceptions.extra.keys() {
            debug!("Ignoring unrecognized exception list `{}`", key);
        }

        (rules, report)
    }

    /// Load rules, degrading to the built-in defaults on any failure
    pub fn load(path: &Path) -> Loaded<ArchRules> {
        let value = match read_json(path) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("No rules file at {:?}, using built-in protected paths", path);
                return Loaded {
                    value: ArchRules::default(),
                    report: ValidationReport::new(),
                    source: ConfigSource::Defaults,
                };
            }
            Err(e) => {
                warn!("{}", e);
                let mut report = ValidationReport::new();
                report.error("file", e.to_string());
                return Loaded {
                    value: ArchRules::default(),
                    report,
                    source: ConfigSource::Malformed,
                };
            }
        };

        let (value, report) = ArchRules::from_value(value);
        let source = if report.has_errors() {
            warn!("Rules in {:?} are malformed, using built-in protected paths", path);
            ConfigSource::Malformed
        } else {
            ConfigSource::File
        };

        Loaded {
            value,
            report,
            source,
        }
    }

    /// Whether the configured enforcement mode blocks writes
    pub fn enforces_blocking(&self) -> bool {
        self.protected_paths.enforcement.eq_ignore_ascii_case("block")
    }
}
