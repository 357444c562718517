//! Command and file-edit guards
//!
//! Both guards take the raw hook payload from stdin and return a
//! [`GuardOutcome`]. Input that cannot be read or understood is blocked:
//! a request that cannot be parsed cannot be shown to be safe.
//!
//! The bash guard runs three rule tables in order. Network rules block
//! outright, package rules only warn, and write rules feed extracted targets
//! through the protected-path resolver. Network rules see the raw command so
//! a download hidden in quotes still blocks; the other tables only see
//! unquoted text.

mod file;
pub mod normalize;
pub mod patterns;
pub mod targets;

pub use file::{evaluate_file_edit, file_paths_from_input};

use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::canonical::compute_relative;
use crate::config::ArchRules;
use crate::context::EvaluationContext;
use crate::decision::{Diagnostic, GuardOutcome};
use crate::protection::{is_protected, PathDecision};
use patterns::{Action, NETWORK_RULES, PACKAGE_RULES};
use targets::scan_writes;

/// Parse a hook payload; `Ok(None)` for empty input
pub(crate) fn parse_payload(raw: &str) -> Result<Option<Value>, String> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| format!("hook input is not valid JSON ({e})"))
}

/// Extract `tool_input.command` from a Bash hook payload
pub fn command_from_input(raw: &str) -> Result<Option<String>, String> {
    let Some(payload) = parse_payload(raw)? else {
        return Ok(None);
    };
    payload
        .get("tool_input")
        .and_then(|input| input.get("command"))
        .and_then(Value::as_str)
        .map(|command| Some(command.to_string()))
        .ok_or_else(|| "hook input has no string `tool_input.command`".to_string())
}

/// Evaluate a Bash PreToolUse payload
pub fn evaluate_bash(raw_stdin: &str, ctx: &EvaluationContext) -> GuardOutcome {
    match command_from_input(raw_stdin) {
        Ok(Some(command)) => evaluate_command(&command, ctx),
        Ok(None) => {
            debug!("Empty hook input, nothing to check");
            GuardOutcome::allow()
        }
        Err(reason) => GuardOutcome::block(format!(
            "Could not read the command to check: {reason}. Refusing to run an unverified command."
        )),
    }
}

/// Evaluate one shell command string
pub fn evaluate_command(command: &str, ctx: &EvaluationContext) -> GuardOutcome {
    let command = normalize::collapse_whitespace(command);
    if command.is_empty() {
        return GuardOutcome::allow();
    }
    debug!("Evaluating command: {}", command);

    for rule in NETWORK_RULES.iter().filter(|r| r.action == Action::Block) {
        if rule.pattern.is_match(&command) {
            info!("Blocked command ({}): {}", rule.label, command);
            return GuardOutcome::block(format!(
                "{} in `{}`. Download the script, review it, and run it as a separate step.",
                rule.label, command
            ));
        }
    }

    let mut outcome = GuardOutcome::allow();
    let masked = normalize::mask_quoted(&command);

    for rule in PACKAGE_RULES.iter() {
        if rule.pattern.is_match(&masked.text) {
            outcome.push(Diagnostic::warn(format!(
                "{} detected. Make sure the new dependency is intended.",
                rule.label
            )));
        }
    }

    let scan = scan_writes(&command);
    for target in &scan.targets {
        if target.is_dynamic() {
            outcome.push(Diagnostic::warn(format!(
                "Write target `{}` ({}) depends on a shell expansion and cannot be checked before it runs",
                target.path, target.rule
            )));
            continue;
        }

        let rel = compute_relative(Path::new(&target.path), &ctx.paths.root);
        let decision = is_protected(&rel, &ctx.rules);
        if apply_path_decision(&mut outcome, &rel, &decision, &ctx.rules, target.rule) {
            info!("Blocked write to protected path {}", rel);
            return outcome;
        }
    }

    for segment in &scan.unresolved {
        outcome.push(Diagnostic::warn(format!(
            "`{segment}` looks like it writes files, but no target could be determined. Check it does not touch protected paths."
        )));
    }

    outcome
}

/// Fold one path decision into the outcome; returns true when it blocked
pub(crate) fn apply_path_decision(
    outcome: &mut GuardOutcome,
    rel: &str,
    decision: &PathDecision,
    rules: &ArchRules,
    action: &str,
) -> bool {
    let Some(prefix) = decision.matched_prefix.as_deref() else {
        return false;
    };

    if decision.is_allowed {
        outcome.push(Diagnostic::notice(format!(
            "`{rel}` is inside protected `{prefix}` but listed in exceptions.allowed_core_edits"
        )));
        return false;
    }

    let message = format!(
        "{action} targets protected path `{rel}` (matched `{prefix}`). {} A human must update architecture/rules.json to allow this.",
        rules.protected_paths.message
    );

    if rules.enforces_blocking() {
        outcome.deny(message);
        true
    } else {
        outcome.push(Diagnostic::warn(message));
        false
    }
}
