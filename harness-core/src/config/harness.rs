//! Harness behavior configuration (`harness.config.json`)
//!
//! Validation runs over the raw `serde_json::Value` rather than a derived
//! deserializer, so an unknown key or a mistyped value turns into a
//! [`ValidationIssue`](super::validation::ValidationIssue) instead of a parse
//! failure. The typed config is then assembled from whatever was valid, with
//! defaults filling the gaps.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, warn};

use super::skills::SkillCatalog;
use super::validation::ValidationReport;
use super::{read_json, ConfigSource, Loaded};
use crate::error::{HarnessError, Result};

/// Accepted range for `restrictions.maxParallelAgents`
pub const MAX_PARALLEL_AGENTS_RANGE: RangeInclusive<i64> = 1..=100;

/// Accepted range for `restrictions.autoFixRetries`
pub const AUTO_FIX_RETRIES_RANGE: RangeInclusive<i64> = 0..=20;

const TOP_LEVEL_KEYS: &[&str] = &["version", "safeMode", "restrictions"];
const RESTRICTION_KEYS: &[&str] = &["maxParallelAgents", "autoFixRetries", "requireConfirmation"];

/// Top-level harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    pub version: String,
    pub safe_mode: bool,
    pub restrictions: Restrictions,
}

/// Limits and gates applied to agent behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Restrictions {
    pub max_parallel_agents: u32,
    pub auto_fix_retries: u32,
    /// Keyword base forms (e.g. `deploy`) that need human confirmation
    pub require_confirmation: BTreeSet<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            safe_mode: true,
            restrictions: Restrictions::default(),
        }
    }
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            max_parallel_agents: 3,
            auto_fix_retries: 3,
            require_confirmation: BTreeSet::from(["deploy".to_string()]),
        }
    }
}

impl Restrictions {
    /// Whether activating `keyword` needs explicit human confirmation
    ///
    /// Gated when an entry equals the keyword's base form (`deploy` for
    /// `deploy:`), or when `base:` is a prefix of an entry. Case-insensitive.
    pub fn requires_confirmation(&self, keyword: &str) -> bool {
        let base = keyword_base(keyword);
        if base.is_empty() {
            return false;
        }
        let with_colon = format!("{base}:");
        self.require_confirmation.iter().any(|entry| {
            let entry = entry.trim().to_lowercase();
            entry == base || entry.starts_with(&with_colon)
        })
    }
}

/// Lowercased keyword without its trailing colon (`Deploy:` → `deploy`)
pub fn keyword_base(keyword: &str) -> String {
    keyword.trim().trim_end_matches(':').to_lowercase()
}

impl HarnessConfig {
    /// Validate a parsed document and build the config from its valid parts
    pub fn from_value(value: &Value) -> (HarnessConfig, ValidationReport) {
        let mut report = ValidationReport::new();
        let mut config = HarnessConfig::default();

        let Some(root) = value.as_object() else {
            report.error("root", "Configuration must be a JSON object");
            return (config, report);
        };

        warn_unknown_keys(root, TOP_LEVEL_KEYS, "", &mut report);

        match root.get("version") {
            None => report.error("version", "Missing required key `version`"),
            Some(Value::String(s)) if s.trim().is_empty() => {
                report.error("version", "`version` must not be empty")
            }
            Some(Value::String(s)) => config.version = s.clone(),
            Some(other) => report.error(
                "version",
                format!("`version` must be a string, found {}", type_name(other)),
            ),
        }

        match root.get("safeMode") {
            None => report.error("safeMode", "Missing required key `safeMode`"),
            Some(Value::Bool(b)) => config.safe_mode = *b,
            Some(other) => report.error(
                "safeMode",
                format!("`safeMode` must be a boolean, found {}", type_name(other)),
            ),
        }

        match root.get("restrictions") {
            None => report.error("restrictions", "Missing required key `restrictions`"),
            Some(Value::Object(restrictions)) => {
                config.restrictions = parse_restrictions(restrictions, &mut report)
            }
            Some(other) => report.error(
                "restrictions",
                format!("`restrictions` must be an object, found {}", type_name(other)),
            ),
        }

        (config, report)
    }

    /// Load from disk; a missing file yields defaults
    ///
    /// Malformed JSON is an error here. Callers evaluating hooks use
    /// [`HarnessConfig::load_or_default`] instead.
    pub fn load(path: &Path) -> Result<Loaded<HarnessConfig>> {
        let Some(value) = read_json(path)? else {
            debug!("No harness config at {:?}, using defaults", path);
            return Ok(Loaded {
                value: HarnessConfig::default(),
                report: ValidationReport::new(),
                source: ConfigSource::Defaults,
            });
        };

        let (value, report) = HarnessConfig::from_value(&value);
        Ok(Loaded {
            value,
            report,
            source: ConfigSource::File,
        })
    }

    /// Load for evaluation: malformed files degrade to defaults with a warning
    pub fn load_or_default(path: &Path) -> Loaded<HarnessConfig> {
        match HarnessConfig::load(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("{}", e);
                let mut report = ValidationReport::new();
                report.error("file", e.to_string());
                Loaded {
                    value: HarnessConfig::default(),
                    report,
                    source: ConfigSource::Malformed,
                }
            }
        }
    }

    /// Strict validation for `harness config validate`
    ///
    /// Missing or unparsable files are errors, not defaults.
    pub fn validate_file(path: &Path) -> Result<ValidationReport> {
        match read_json(path)? {
            Some(value) => Ok(HarnessConfig::from_value(&value).1),
            None => Err(HarnessError::ConfigMissing(path.to_path_buf())),
        }
    }

    /// Warn about confirmation entries that name no known magic keyword
    pub fn check_confirmation_keywords(&self, catalog: &SkillCatalog, report: &mut ValidationReport) {
        let known: BTreeSet<String> = catalog
            .iter()
            .filter_map(|(_, skill)| skill.magic_keyword.as_deref())
            .map(keyword_base)
            .collect();

        for entry in &self.restrictions.require_confirmation {
            let base = keyword_base(entry.split(':').next().unwrap_or(entry));
            if !known.contains(&base) {
                report.warning(
                    "restrictions.requireConfirmation",
                    format!("`{entry}` does not match any magic keyword in the skill catalog"),
                );
            }
        }
    }
}

fn parse_restrictions(obj: &Map<String, Value>, report: &mut ValidationReport) -> Restrictions {
    let mut restrictions = Restrictions::default();

    warn_unknown_keys(obj, RESTRICTION_KEYS, "restrictions.", report);

    if let Some(n) = bounded_int(obj, "maxParallelAgents", MAX_PARALLEL_AGENTS_RANGE, report) {
        restrictions.max_parallel_agents = n;
    }
    if let Some(n) = bounded_int(obj, "autoFixRetries", AUTO_FIX_RETRIES_RANGE, report) {
        restrictions.auto_fix_retries = n;
    }

    let rule_id = "restrictions.requireConfirmation";
    match obj.get("requireConfirmation") {
        None => report.error(rule_id, "Missing required key `requireConfirmation`"),
        Some(Value::Array(items)) => {
            let mut entries = BTreeSet::new();
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) if s.trim().is_empty() => {
                        report.warning(rule_id, format!("Entry {i} is an empty string"))
                    }
                    Value::String(s) => {
                        entries.insert(s.trim().to_string());
                    }
                    other => report.error(
                        rule_id,
                        format!("Entry {i} must be a string, found {}", type_name(other)),
                    ),
                }
            }
            restrictions.require_confirmation = entries;
        }
        Some(other) => report.error(
            rule_id,
            format!("`requireConfirmation` must be an array, found {}", type_name(other)),
        ),
    }

    restrictions
}

fn bounded_int(
    obj: &Map<String, Value>,
    key: &str,
    range: RangeInclusive<i64>,
    report: &mut ValidationReport,
) -> Option<u32> {
    let rule_id = format!("restrictions.{key}");
    let Some(value) = obj.get(key) else {
        report.error(rule_id, format!("Missing required key `{key}`"));
        return None;
    };

    let Some(n) = value.as_i64() else {
        report.error(
            rule_id,
            format!("`{key}` must be an integer, found {}", type_name(value)),
        );
        return None;
    };

    if !range.contains(&n) {
        report.error(
            rule_id,
            format!(
                "`{key}` is {n}, expected a value between {} and {}",
                range.start(),
                range.end()
            ),
        );
        return None;
    }

    u32::try_from(n).ok()
}

fn warn_unknown_keys(
    obj: &Map<String, Value>,
    known: &[&str],
    prefix: &str,
    report: &mut ValidationReport,
) {
    for key in obj.keys() {
        if key == "$schema" || known.contains(&key.as_str()) {
            continue;
        }
        report.warning(
            format!("{prefix}{key}"),
            format!("Unknown key `{prefix}{key}` is ignored"),
        );
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
