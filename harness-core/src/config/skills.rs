//! Skill catalog (`skills/skill-rules.json`)
//!
//! Entries are parsed one at a time so that a single malformed skill is
//! reported and skipped instead of discarding the whole catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::validation::ValidationReport;
use super::{read_json, ConfigSource, Loaded};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    Agent,
    Mode,
    #[default]
    Skill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    /// The agent must use exactly this skill
    Require,
    #[default]
    Suggest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptTriggers {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDefinition {
    #[serde(rename = "type")]
    pub kind: SkillKind,
    pub enforcement: Enforcement,
    pub priority: Priority,
    /// Definition file, relative to the project root
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_triggers: Option<PromptTriggers>,
}

/// Skills keyed by name, iterated in name order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SkillCatalog {
    skills: BTreeMap<String, SkillDefinition>,
}

impl SkillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, skill: SkillDefinition) {
        self.skills.insert(name.into(), skill);
    }

    pub fn get(&self, name: &str) -> Option<&SkillDefinition> {
        self.skills.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SkillDefinition)> {
        self.skills.iter().map(|(name, skill)| (name.as_str(), skill))
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skills that declare a magic keyword, with the keyword
    pub fn magic_keywords(&self) -> impl Iterator<Item = (&str, &str, &SkillDefinition)> {
        self.iter().filter_map(|(name, skill)| {
            skill
                .magic_keyword
                .as_deref()
                .map(|keyword| (name, keyword, skill))
        })
    }

    /// Parse a catalog document, either a bare map or `{ "skills": { ... } }`
    pub fn from_value(value: &Value) -> (SkillCatalog, ValidationReport) {
        let mut report = ValidationReport::new();
        let mut catalog = SkillCatalog::new();

        let Some(root) = value.as_object() else {
            report.error("catalog", "Skill catalog must be a JSON object");
            return (catalog, report);
        };

        let entries = match root.get("skills") {
            Some(Value::Object(inner)) if !inner.contains_key("file") => inner,
            _ => root,
        };

        for (name, entry) in entries {
            match parse_skill(name, entry, &mut report) {
                Some(skill) => catalog.insert(name.clone(), skill),
                None => debug!("Skipping malformed skill `{}`", name),
            }
        }

        (catalog, report)
    }

    /// Load the catalog; missing or malformed files yield an empty catalog
    pub fn load(path: &Path) -> Loaded<SkillCatalog> {
        match read_json(path) {
            Ok(Some(value)) => {
                let (value, report) = SkillCatalog::from_value(&value);
                Loaded {
                    value,
                    report,
                    source: ConfigSource::File,
                }
            }
            Ok(None) => {
                debug!("No skill catalog at {:?}", path);
                Loaded {
                    value: SkillCatalog::new(),
                    report: ValidationReport::new(),
                    source: ConfigSource::Defaults,
                }
            }
            Err(e) => {
                warn!("{}", e);
                let mut report = ValidationReport::new();
                report.error("file", e.to_string());
                Loaded {
                    value: SkillCatalog::new(),
                    report,
                    source: ConfigSource::Malformed,
                }
            }
        }
    }
}

fn parse_skill(name: &str, entry: &Value, report: &mut ValidationReport) -> Option<SkillDefinition> {
    let Some(obj) = entry.as_object() else {
        report.error(format!("skills.{name}"), "Skill definition must be an object");
        return None;
    };

    let file = match obj.get("file") {
        Some(Value::String(file)) if !file.trim().is_empty() => PathBuf::from(file),
        _ => {
            report.error(
                format!("skills.{name}.file"),
                "Skill definition needs a non-empty `file` path",
            );
            return None;
        }
    };

    let magic_keyword = match obj.get("magicKeyword") {
        None | Some(Value::Null) => None,
        Some(Value::String(k)) if !k.trim().is_empty() => Some(k.trim().to_string()),
        Some(_) => {
            report.warning(
                format!("skills.{name}.magicKeyword"),
                "`magicKeyword` must be a non-empty string, ignoring it",
            );
            None
        }
    };

    Some(SkillDefinition {
        kind: enum_field(obj, name, "type", report),
        enforcement: enum_field(obj, name, "enforcement", report),
        priority: enum_field(obj, name, "priority", report),
        file,
        magic_keyword,
        prompt_triggers: prompt_triggers(obj, name, report),
    })
}

/// Unknown or mistyped enum values warn and fall back to the default
fn enum_field<T>(obj: &Map<String, Value>, name: &str, key: &str, report: &mut ValidationReport) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    let Some(raw) = obj.get(key) else {
        return T::default();
    };

    let normalized = match raw {
        Value::String(s) => Value::String(s.trim().to_lowercase()),
        other => other.clone(),
    };

    serde_json::from_value(normalized).unwrap_or_else(|_| {
        report.warning(
            format!("skills.{name}.{key}"),
            format!("Unknown {key} {raw}, using the default"),
        );
        T::default()
    })
}

fn prompt_triggers(
    obj: &Map<String, Value>,
    name: &str,
    report: &mut ValidationReport,
) -> Option<PromptTriggers> {
    let raw = obj.get("promptTriggers")?;
    let rule_id = format!("skills.{name}.promptTriggers");

    let Some(keywords) = raw.get("keywords").and_then(Value::as_array) else {
        report.warning(rule_id, "`promptTriggers.keywords` must be an array of strings");
        return None;
    };

    let keywords: Vec<String> = keywords
        .iter()
        .filter_map(|k| match k.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => {
                report.warning(rule_id.clone(), format!("Ignoring trigger keyword {k}"));
                None
            }
        })
        .collect();

    Some(PromptTriggers { keywords })
}
