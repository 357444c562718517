use crate::audit::CheckResult;
use crate::config::rules::DEFAULT_PROTECTED_PATHS;
use crate::context::EvaluationContext;
use crate::protection::is_protected;

/// A path inside `zone` that no sane exception would cover
fn probe_path(zone: &str) -> String {
    if zone.ends_with('/') {
        format!("{zone}__audit_probe__")
    } else {
        zone.to_string()
    }
}

/// Core zones are protected and exceptions stay inside protected zones
pub fn check(ctx: &EvaluationContext) -> Vec<CheckResult> {
    let rules = &ctx.rules;
    let mut results: Vec<CheckResult> = DEFAULT_PROTECTED_PATHS
        .iter()
        .map(|zone| {
            let id = format!("protection.{}", zone.trim_matches(|c| c == '/' || c == '.'));
            let description = format!("{zone} is protected");
            let decision = is_protected(&probe_path(zone), rules);
            match decision.matched_prefix {
                _ if decision.blocked => CheckResult::pass(id, description),
                Some(prefix) => CheckResult::fail(
                    id,
                    description,
                    format!("matched `{prefix}` but an exception allows it"),
                ),
                None => CheckResult::fail(id, description, "no protected prefix matches"),
            }
        })
        .collect();

    results.push(CheckResult::check(
        "protection.enforcement",
        "protected paths are enforced by blocking",
        rules.enforces_blocking(),
        format!("enforcement is `{}`", rules.protected_paths.enforcement),
    ));

    let stray: Vec<&str> = rules
        .exceptions
        .allowed_core_edits
        .iter()
        .filter(|e| is_protected(e, rules).matched_prefix.is_none())
        .map(String::as_str)
        .collect();
    let scoped = CheckResult::check(
        "protection.exceptions_scoped",
        "every exception lies inside a protected zone",
        stray.is_empty(),
        format!("outside any protected zone: {}", stray.join(", ")),
    );
    let count = rules.exceptions.allowed_core_edits.len();
    results.push(if scoped.pass {
        scoped.with_detail(format!("{count} exceptions"))
    } else {
        scoped
    });

    results
}
