use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::audit::CheckResult;
use crate::context::EvaluationContext;

/// Marker proving a hook script can block
pub const FAIL_CLOSED_MARKER: &str = "exit 2";

/// Whether a Claude Code hook matcher selects `tool`
///
/// Matchers are regular expressions; an empty matcher or `*` selects every
/// tool.
pub fn matcher_covers(matcher: &str, tool: &str) -> bool {
    let matcher = matcher.trim();
    if matcher.is_empty() || matcher == "*" {
        return true;
    }
    match Regex::new(&format!("^(?:{matcher})$")) {
        Ok(re) => re.is_match(tool),
        Err(_) => matcher.split('|').any(|m| m.trim() == tool),
    }
}

/// Commands of every hook registered for `event` whose matcher covers all `tools`
fn wired_commands(settings: &Value, event: &str, tools: &[&str]) -> Vec<String> {
    let Some(entries) = settings
        .get("hooks")
        .and_then(|h| h.get(event))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| {
            let matcher = entry.get("matcher").and_then(Value::as_str).unwrap_or("");
            tools.iter().all(|tool| matcher_covers(matcher, tool))
        })
        .filter_map(|entry| entry.get("hooks").and_then(Value::as_array))
        .flatten()
        .filter(|hook| hook.get("type").and_then(Value::as_str) == Some("command"))
        .filter_map(|hook| hook.get("command").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn wiring(settings: &Value, id: &str, description: &str, event: &str, tools: &[&str]) -> CheckResult {
    let commands = wired_commands(settings, event, tools);
    if commands.is_empty() {
        CheckResult::fail(id, description, format!("no {event} command hook"))
    } else {
        CheckResult::pass(id, description).with_detail(commands.join(", "))
    }
}

fn script(id: &str, path: &Path, ctx: &EvaluationContext) -> CheckResult {
    let rel = ctx.paths.display_relative(path);
    let description = format!("{rel} exists and fails closed");
    match fs::read_to_string(path) {
        Err(_) => CheckResult::fail(id, description, "missing"),
        Ok(source) if source.contains(FAIL_CLOSED_MARKER) => CheckResult::pass(id, description),
        Ok(_) => CheckResult::fail(id, description, format!("no `{FAIL_CLOSED_MARKER}` in script")),
    }
}

/// Hooks are registered in .claude/settings.json and the scripts can block
pub fn check(ctx: &EvaluationContext) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let settings = fs::read_to_string(&ctx.paths.settings)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()));

    match settings {
        Ok(settings) => {
            results.push(wiring(
                &settings,
                "hooks.bash_wired",
                "PreToolUse hook covers Bash",
                "PreToolUse",
                &["Bash"],
            ));
            results.push(wiring(
                &settings,
                "hooks.edit_wired",
                "PreToolUse hook covers Edit and Write",
                "PreToolUse",
                &["Edit", "Write"],
            ));
            results.push(wiring(
                &settings,
                "hooks.prompt_wired",
                "UserPromptSubmit hook is registered",
                "UserPromptSubmit",
                &[],
            ));
        }
        Err(reason) => {
            results.push(CheckResult::fail(
                "hooks.settings",
                ".claude/settings.json is readable",
                reason,
            ));
        }
    }

    results.push(script("hooks.bash_script", &ctx.paths.bash_hook, ctx));
    results.push(script("hooks.file_script", &ctx.paths.file_hook, ctx));
    results.push(script("hooks.prompt_script", &ctx.paths.prompt_hook, ctx));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::ProjectPaths;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_matcher_covers() {
        assert!(matcher_covers("Bash", "Bash"));
        assert!(matcher_covers("Edit|Write", "Write"));
        assert!(matcher_covers("Edit|MultiEdit|Write", "Edit"));
        assert!(matcher_covers("*", "Edit"));
        assert!(matcher_covers("", "Bash"));
        assert!(!matcher_covers("Edit", "Write"));
        assert!(!matcher_covers("BashOutput", "Bash"));
    }

    #[test]
    fn test_wiring_from_settings() {
        let settings = json!({
            "hooks": {
                "PreToolUse": [
                    { "matcher": "Bash", "hooks": [{ "type": "command", "command": "hooks/pre-bash.sh" }] },
                    { "matcher": "Edit", "hooks": [{ "type": "command", "command": "hooks/protect-paths.sh" }] }
                ],
                "UserPromptSubmit": [
                    { "hooks": [{ "type": "command", "command": "hooks/magic-keywords.sh" }] }
                ]
            }
        });

        assert_eq!(wired_commands(&settings, "PreToolUse", &["Bash"]), vec!["hooks/pre-bash.sh"]);
        // Edit alone does not cover Write
        assert!(wired_commands(&settings, "PreToolUse", &["Edit", "Write"]).is_empty());
        assert_eq!(
            wired_commands(&settings, "UserPromptSubmit", &[]),
            vec!["hooks/magic-keywords.sh"]
        );
    }

    #[test]
    fn test_script_needs_fail_closed_marker() {
        let dir = TempDir::new().unwrap();
        let ctx = EvaluationContext::load(ProjectPaths::new(dir.path()));
        fs::create_dir_all(&ctx.paths.hooks_dir).unwrap();
        fs::write(&ctx.paths.bash_hook, "#!/bin/sh\nexit 0\n").unwrap();
        fs::write(&ctx.paths.file_hook, "#!/bin/sh\nharness guard file || exit 2\n").unwrap();

        let results = check(&ctx);
        let by_id = |id: &str| results.iter().find(|r| r.id == id).unwrap().clone();

        assert!(!by_id("hooks.settings").pass);
        assert!(!by_id("hooks.bash_script").pass);
        assert!(by_id("hooks.file_script").pass);
        assert_eq!(by_id("hooks.prompt_script").detail.as_deref(), Some("missing"));
    }
}
