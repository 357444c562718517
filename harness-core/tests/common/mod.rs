//! Test helper functions for integration tests
//!
//! Shared across the test files in tests/ using the tests/common/ pattern.

#![allow(dead_code)]

use anyhow::Result;
use harness_core::{EvaluationContext, ProjectPaths};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn write(root: &Path, rel: &str, content: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn write_json(root: &Path, rel: &str, value: &Value) -> Result<()> {
    write(root, rel, &serde_json::to_string_pretty(value)?)
}

pub fn harness_config() -> Value {
    json!({
        "version": "1.0",
        "safeMode": true,
        "restrictions": {
            "maxParallelAgents": 3,
            "autoFixRetries": 3,
            "requireConfirmation": ["deploy"]
        }
    })
}

pub fn rules() -> Value {
    json!({
        "layers": {
            "order": ["types", "config", "repo", "service", "runtime", "ui"],
            "direction": "forward"
        },
        "protected_paths": {
            "paths": ["harness/", "hooks/", "architecture/", ".claude/", "CLAUDE.md"],
            "enforcement": "block",
            "message": "Protected harness file."
        },
        "exceptions": {
            "allowed_core_edits": ["harness/notes.md"],
            "allowed_cross_layer": []
        }
    })
}

pub fn skill_catalog() -> Value {
    json!({
        "builder": {
            "type": "agent",
            "enforcement": "require",
            "priority": "high",
            "file": "skills/builder.md",
            "magicKeyword": "build:",
            "promptTriggers": { "keywords": ["implement", "feature"] }
        },
        "fixer": {
            "type": "skill",
            "enforcement": "suggest",
            "priority": "medium",
            "file": "skills/fixer.md",
            "magicKeyword": "fix:",
            "promptTriggers": { "keywords": ["bug", "crash", "error"] }
        },
        "deployer": {
            "type": "agent",
            "enforcement": "require",
            "priority": "high",
            "file": "skills/deployer.md",
            "magicKeyword": "deploy:"
        }
    })
}

pub fn settings() -> Value {
    let command = |script: &str| json!([{ "type": "command", "command": script }]);
    json!({
        "hooks": {
            "PreToolUse": [
                { "matcher": "Bash", "hooks": command("$CLAUDE_PROJECT_DIR/hooks/pre-bash.sh") },
                { "matcher": "Edit|MultiEdit|Write", "hooks": command("$CLAUDE_PROJECT_DIR/hooks/protect-paths.sh") }
            ],
            "UserPromptSubmit": [
                { "hooks": command("$CLAUDE_PROJECT_DIR/hooks/magic-keywords.sh") }
            ]
        }
    })
}

/// Stand-in hook scripts that decide like the real guards on the audit probes
pub const FAKE_BASH_HOOK: &str = r#"#!/bin/sh
input=$(cat)
case "$input" in
  *'"command"'*) ;;
  *) echo "BLOCKED: unreadable input" >&2; exit 2 ;;
esac
case "$input" in
  *'> harness/'*|*'| bash'*) echo "BLOCKED: denied" >&2; exit 2 ;;
esac
exit 0
"#;

pub const FAKE_FILE_HOOK: &str = r#"#!/bin/sh
input=$(cat)
case "$input" in
  *'/hooks/'*|*'/harness/'*) echo "BLOCKED: protected" >&2; exit 2 ;;
esac
exit 0
"#;

pub const FAKE_PROMPT_HOOK: &str = r#"#!/bin/sh
input=$(cat)
[ -n "$input" ] || exit 2
exit 0
"#;

/// Fully wired harness project: every audit check outside tooling passes
pub fn create_harness_project(root: &Path) -> Result<()> {
    write_json(root, "harness.config.json", &harness_config())?;
    write_json(root, "architecture/rules.json", &rules())?;
    write_json(root, "skills/skill-rules.json", &skill_catalog())?;
    write_json(root, ".claude/settings.json", &settings())?;
    write(root, "CLAUDE.md", "# Project rules\n")?;
    for skill in ["builder", "fixer", "deployer"] {
        write(root, &format!("skills/{skill}.md"), &format!("# {skill}\n"))?;
    }
    write(root, "hooks/pre-bash.sh", FAKE_BASH_HOOK)?;
    write(root, "hooks/protect-paths.sh", FAKE_FILE_HOOK)?;
    write(root, "hooks/magic-keywords.sh", FAKE_PROMPT_HOOK)?;
    write(root, "memory/MISTAKES.md", "# Mistakes\n- never skip the tests\n")?;
    write(root, "memory/DECISIONS.md", "# Decisions\n- layers flow forward\n")?;
    Ok(())
}

/// Temp project plus its loaded context
pub fn harness_project() -> Result<(TempDir, EvaluationContext)> {
    init_test_logging();
    let dir = TempDir::new()?;
    create_harness_project(dir.path())?;
    let ctx = EvaluationContext::load(ProjectPaths::new(dir.path()));
    Ok((dir, ctx))
}

pub fn bash_payload(command: &str) -> String {
    json!({ "tool_name": "Bash", "tool_input": { "command": command } }).to_string()
}

pub fn edit_payload(path: &Path) -> String {
    json!({
        "tool_name": "Edit",
        "tool_input": { "file_path": path, "old_string": "a", "new_string": "b" }
    })
    .to_string()
}
