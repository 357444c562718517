//! File edit guard for Edit, Write, MultiEdit and NotebookEdit payloads

use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::{apply_path_decision, parse_payload};
use crate::canonical::compute_relative;
use crate::context::EvaluationContext;
use crate::decision::{Diagnostic, GuardOutcome};
use crate::protection::{is_protected, layer_advice};

const PATH_FIELDS: &[&str] = &["file_path", "path", "notebook_path"];

/// Every path named in a file tool payload, in field order
pub fn file_paths_from_input(raw: &str) -> Result<Option<Vec<String>>, String> {
    let Some(payload) = parse_payload(raw)? else {
        return Ok(None);
    };

    let Some(input) = payload.get("tool_input").and_then(Value::as_object) else {
        return Err("hook input has no `tool_input` object".to_string());
    };

    let mut paths: Vec<String> = PATH_FIELDS
        .iter()
        .filter_map(|field| input.get(*field).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    if let Some(edits) = input.get("edits").and_then(Value::as_array) {
        paths.extend(
            edits
                .iter()
                .filter_map(|edit| edit.get("file_path").and_then(Value::as_str))
                .map(str::to_string),
        );
    }

    let mut seen = HashSet::new();
    paths.retain(|p| !p.trim().is_empty() && seen.insert(p.clone()));

    if paths.is_empty() {
        return Err("hook input names no file path".to_string());
    }
    Ok(Some(paths))
}

/// Evaluate a file tool PreToolUse payload
pub fn evaluate_file_edit(raw_stdin: &str, ctx: &EvaluationContext) -> GuardOutcome {
    let paths = match file_paths_from_input(raw_stdin) {
        Ok(Some(paths)) => paths,
        Ok(None) => {
            debug!("Empty hook input, nothing to check");
            return GuardOutcome::allow();
        }
        Err(reason) => {
            return GuardOutcome::block(format!(
                "Could not read the file edit to check: {reason}. Refusing an unverified edit."
            ))
        }
    };

    let mut outcome = GuardOutcome::allow();
    for path in &paths {
        let rel = compute_relative(Path::new(path), &ctx.paths.root);
        let decision = is_protected(&rel, &ctx.rules);
        if apply_path_decision(&mut outcome, &rel, &decision, &ctx.rules, "Edit") {
            info!("Blocked edit of protected path {}", rel);
            return outcome;
        }

        if let Some(advice) = layer_advice(&rel, &ctx.rules) {
            outcome.push(Diagnostic::info(advice.render()));
        }
    }

    outcome
}
