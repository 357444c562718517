use crate::audit::CheckResult;
use crate::best_effort::BestEffort;
use crate::context::EvaluationContext;
use crate::process;

/// External commands the hooks lean on
pub fn check(ctx: &EvaluationContext) -> Vec<CheckResult> {
    let root = &ctx.paths.root;

    let git = match process::command_exists("git", root) {
        BestEffort::Done(true) => CheckResult::pass("tooling.git", "git is installed"),
        BestEffort::Done(false) => CheckResult::fail("tooling.git", "git is installed", "not on PATH"),
        BestEffort::Failed(reason) | BestEffort::Skipped(reason) => {
            CheckResult::fail("tooling.git", "git is installed", reason)
        }
    };

    // Hook scripts fall back to sed when jq is absent
    let jq = match process::command_exists("jq", root) {
        BestEffort::Done(true) => CheckResult::pass("tooling.jq", "jq is installed"),
        BestEffort::Done(false) => CheckResult::skip("tooling.jq", "jq is installed", "not on PATH"),
        BestEffort::Failed(reason) | BestEffort::Skipped(reason) => {
            CheckResult::skip("tooling.jq", "jq is installed", reason)
        }
    };

    vec![git, jq]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::CheckStatus;
    use crate::paths::ProjectPaths;
    use tempfile::TempDir;

    #[test]
    fn test_jq_never_fails() {
        let dir = TempDir::new().unwrap();
        let results = check(&EvaluationContext::load(ProjectPaths::new(dir.path())));
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].id, "tooling.jq");
        assert_ne!(results[1].status(), CheckStatus::Fail);
    }
}
