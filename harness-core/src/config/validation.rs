//! Validation issues for configuration files
//!
//! Hard errors (missing or mistyped required fields) and soft warnings
//! (unknown keys, unknown enum values) are reported separately so that
//! `harness config validate` can map them to distinct exit codes.

use serde::Serialize;

/// Severity levels for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,   // Configuration cannot be trusted as written
    Warning, // Ignored or defaulted, but probably a mistake
}

/// A validation issue found in a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Stable identifier, e.g. `restrictions.maxParallelAgents`
    pub rule_id: String,
    pub message: String,
}

/// All issues found in one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

/// Exit code for `config validate` with no issues
pub const VALIDATE_OK: i32 = 0;
/// Exit code for `config validate` with at least one error
pub const VALIDATE_ERRORS: i32 = 1;
/// Exit code for `config validate` with warnings only
pub const VALIDATE_WARNINGS: i32 = 2;

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, rule_id: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            rule_id: rule_id.into(),
            message: message.into(),
        });
    }

    pub fn warning(&mut self, rule_id: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            rule_id: rule_id.into(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// 0 when clean, 1 on any error, 2 on warnings only
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            VALIDATE_ERRORS
        } else if self.warning_count() > 0 {
            VALIDATE_WARNINGS
        } else {
            VALIDATE_OK
        }
    }

    /// One-line summary of messages at the given severity
    pub fn summarize(&self, severity: Severity) -> String {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(|i| format!("{}: {}", i.rule_id, i.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let mut report = ValidationReport::new();
        assert_eq!(report.exit_code(), VALIDATE_OK);

        report.warning("extra", "Unknown key");
        assert_eq!(report.exit_code(), VALIDATE_WARNINGS);

        report.error("version", "Missing");
        assert_eq!(report.exit_code(), VALIDATE_ERRORS);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_summarize_filters_by_severity() {
        let mut report = ValidationReport::new();
        report.error("a", "first");
        report.warning("b", "second");
        report.error("c", "third");
        assert_eq!(report.summarize(Severity::Error), "a: first; c: third");
        assert_eq!(report.summarize(Severity::Warning), "b: second");
    }
}
