//! Append-only activation log (`logs/skill-activations.log`)
//!
//! One pipe-delimited line per activation:
//! `timestamp|skill|keyword|snippet`. Appends are not locked; concurrent
//! writers rely on each line being a single short write.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::best_effort::BestEffort;
use crate::error::HarnessError;

/// Maximum prompt characters kept in a log line
pub const SNIPPET_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub timestamp: DateTime<Utc>,
    pub skill: String,
    pub keyword: String,
    pub snippet: String,
}

impl Activation {
    pub fn new(skill: &str, keyword: &str, prompt: &str) -> Self {
        Self::at(Utc::now(), skill, keyword, prompt)
    }

    pub fn at(timestamp: DateTime<Utc>, skill: &str, keyword: &str, prompt: &str) -> Self {
        Self {
            timestamp,
            skill: sanitize(skill),
            keyword: sanitize(keyword),
            snippet: snippet(prompt),
        }
    }

    pub fn log_line(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.skill,
            self.keyword,
            self.snippet
        )
    }
}

/// Keep a field on one line and free of the delimiter
fn sanitize(field: &str) -> String {
    field
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            '|' => '/',
            c => c,
        })
        .collect()
}

/// First [`SNIPPET_CHARS`] characters of the prompt, sanitized
pub fn snippet(prompt: &str) -> String {
    let head: String = prompt.trim().chars().take(SNIPPET_CHARS).collect();
    sanitize(&head)
}

fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("{line}\n").as_bytes())
}

/// Append one activation, creating `logs/` if needed
pub fn append(path: &Path, activation: &Activation) -> BestEffort<()> {
    match write_line(path, &activation.log_line()) {
        Ok(()) => {
            debug!("Logged activation of {} to {:?}", activation.skill, path);
            BestEffort::Done(())
        }
        Err(source) => {
            let reason = source.to_string();
            let err = HarnessError::ActivationLog {
                path: path.to_path_buf(),
                source,
            };
            BestEffort::failed(format!("{err}: {reason}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_log_line_format() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let activation = Activation::at(ts, "builder", "build:", "build: add | login\npage");
        assert_eq!(
            activation.log_line(),
            "2026-03-01T09:30:00Z|builder|build:|build: add / login page"
        );
    }

    #[test]
    fn test_snippet_is_truncated_by_chars() {
        let prompt = "é".repeat(200);
        assert_eq!(snippet(&prompt).chars().count(), SNIPPET_CHARS);
    }

    #[test]
    fn test_append_creates_directory_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs/skill-activations.log");

        assert!(append(&path, &Activation::new("a", "a:", "one")).is_done());
        assert!(append(&path, &Activation::new("b", "b:", "two")).is_done());

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("|a|a:|one"));
        assert!(lines[1].ends_with("|b|b:|two"));
    }

    #[test]
    fn test_append_failure_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        // A file where the logs directory should be
        fs::write(dir.path().join("logs"), "").unwrap();
        let result = append(&dir.path().join("logs/x.log"), &Activation::new("a", "a:", "p"));
        assert!(matches!(result, BestEffort::Failed(_)));
    }
}
