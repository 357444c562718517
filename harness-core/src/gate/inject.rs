//! Context injected into the agent's conversation on activation

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::best_effort::BestEffort;
use crate::config::{Enforcement, SkillDefinition, SkillKind};
use crate::paths::ProjectPaths;
use crate::process::{self, QUICK_TIMEOUT};

/// Lines of memory shown on activation
pub const MEMORY_TAIL_LINES: usize = 30;

const MISTAKE_KEYWORDS: &[&str] = &["fix", "test", "debug"];
const DECISION_KEYWORDS: &[&str] = &["arch", "refactor", "design"];

/// Ask `hooks/prd-resolver.sh <base>` for the source of truth
///
/// The prompt is passed on stdin. Any failure is reported as a single line.
pub fn source_of_truth(paths: &ProjectPaths, base: &str, prompt: &str) -> String {
    let result = process::run_script(
        &paths.prd_resolver,
        &[base],
        Some(prompt),
        &paths.root,
        QUICK_TIMEOUT,
    );

    match result {
        BestEffort::Done(output) if output.success() => {
            let text = output.stdout.trim();
            if text.is_empty() {
                format!("Source of truth: none found for `{base}`")
            } else {
                format!("Source of truth:\n{text}")
            }
        }
        BestEffort::Done(output) => format!(
            "Source of truth unavailable: resolver exited with {}",
            output.status_label()
        ),
        other => {
            let reason = other.reason().unwrap_or("unknown error");
            debug!("PRD resolver not used: {}", reason);
            format!("Source of truth unavailable: {reason}")
        }
    }
}

fn kind_label(kind: SkillKind) -> &'static str {
    match kind {
        SkillKind::Agent => "agent",
        SkillKind::Mode => "mode",
        SkillKind::Skill => "skill",
    }
}

/// Binding or suggestion text for the activated skill
pub fn directive(name: &str, skill: &SkillDefinition) -> String {
    let kind = kind_label(skill.kind);
    let file = skill.file.display();
    match skill.enforcement {
        Enforcement::Require => format!(
            "BINDING: Use the `{name}` {kind} defined in {file} for this request. Do not substitute another skill or agent."
        ),
        Enforcement::Suggest => {
            format!("Suggested: the `{name}` {kind} defined in {file} fits this request.")
        }
    }
}

/// The memory file relevant to a keyword base, if any
pub fn memory_file<'a>(paths: &'a ProjectPaths, base: &str) -> Option<&'a Path> {
    if MISTAKE_KEYWORDS.contains(&base) {
        Some(paths.mistakes.as_path())
    } else if DECISION_KEYWORDS.contains(&base) {
        Some(paths.decisions.as_path())
    } else {
        None
    }
}

/// Last [`MEMORY_TAIL_LINES`] lines of `path`; `None` when unreadable or empty
pub fn tail(path: &Path, lines: usize) -> Option<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No memory excerpt from {:?}: {}", path, e);
            return None;
        }
    };

    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    let excerpt = all[start..].join("\n");
    (!excerpt.trim().is_empty()).then_some(excerpt)
}

/// Memory excerpt block for the keyword base
pub fn memory_excerpt(paths: &ProjectPaths, base: &str) -> Option<String> {
    let file = memory_file(paths, base)?;
    let excerpt = tail(file, MEMORY_TAIL_LINES)?;
    Some(format!(
        "Recent entries from {}:\n{}",
        paths.display_relative(file),
        excerpt
    ))
}
