use std::path::Path;

use crate::audit::CheckResult;
use crate::context::EvaluationContext;

fn exists(id: &str, path: &Path, ctx: &EvaluationContext, dir: bool) -> CheckResult {
    let rel = ctx.paths.display_relative(path);
    let found = if dir { path.is_dir() } else { path.is_file() };
    let description = if dir {
        format!("{rel}/ exists")
    } else {
        format!("{rel} exists")
    };
    CheckResult::check(format!("structure.{id}"), description, found, "missing")
}

fn optional(id: &str, path: &Path, ctx: &EvaluationContext) -> CheckResult {
    let rel = ctx.paths.display_relative(path);
    if path.is_file() {
        CheckResult::pass(format!("structure.{id}"), format!("{rel} exists"))
    } else {
        CheckResult::skip(format!("structure.{id}"), format!("{rel} exists"), "optional")
    }
}

/// Required files and directories are in place
pub fn check(ctx: &EvaluationContext) -> Vec<CheckResult> {
    let paths = &ctx.paths;
    vec![
        exists("claude_md", &paths.claude_md, ctx, false),
        exists("harness_config", &paths.harness_config, ctx, false),
        exists("rules", &paths.rules, ctx, false),
        exists("skill_catalog", &paths.skill_catalog, ctx, false),
        exists("settings", &paths.settings, ctx, false),
        exists("hooks_dir", &paths.hooks_dir, ctx, true),
        optional("mistakes", &paths.mistakes, ctx),
        optional("decisions", &paths.decisions, ctx),
    ]
}
