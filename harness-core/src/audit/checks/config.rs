use std::collections::BTreeMap;

use crate::audit::CheckResult;
use crate::config::harness::keyword_base;
use crate::config::{ArchRules, ConfigSource, HarnessConfig, Severity, SkillCatalog, ValidationReport};
use crate::context::EvaluationContext;

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}

fn with_warnings(result: CheckResult, report: &ValidationReport) -> CheckResult {
    if report.warning_count() > 0 {
        result.with_detail(report.summarize(Severity::Warning))
    } else {
        result
    }
}

fn harness_config(ctx: &EvaluationContext) -> CheckResult {
    let id = "config.harness_valid";
    let description = "harness.config.json is valid";
    match HarnessConfig::validate_file(&ctx.paths.harness_config) {
        Err(e) => CheckResult::fail(id, description, first_line(&e.to_string())),
        Ok(report) if report.has_errors() => {
            CheckResult::fail(id, description, report.summarize(Severity::Error))
        }
        Ok(report) => with_warnings(CheckResult::pass(id, description), &report),
    }
}

fn rules(ctx: &EvaluationContext) -> CheckResult {
    let id = "config.rules_loaded";
    let description = "architecture/rules.json loads without falling back to defaults";
    let loaded = ArchRules::load(&ctx.paths.rules);
    match loaded.source {
        ConfigSource::File => with_warnings(CheckResult::pass(id, description), &loaded.report),
        ConfigSource::Defaults => {
            CheckResult::fail(id, description, "missing, built-in protected paths in effect")
        }
        ConfigSource::Malformed => CheckResult::fail(
            id,
            description,
            first_line(&loaded.report.summarize(Severity::Error)).to_string(),
        ),
    }
}

fn catalog_results(ctx: &EvaluationContext) -> Vec<CheckResult> {
    let id = "config.skill_catalog";
    let description = "skills/skill-rules.json parses";
    let loaded = SkillCatalog::load(&ctx.paths.skill_catalog);

    let parsed = match loaded.source {
        ConfigSource::Defaults => CheckResult::fail(id, description, "missing"),
        _ if loaded.report.has_errors() => CheckResult::fail(
            id,
            description,
            first_line(&loaded.report.summarize(Severity::Error)).to_string(),
        ),
        _ => {
            let mut detail = format!("{} skills", loaded.value.len());
            if loaded.report.warning_count() > 0 {
                detail.push_str("; ");
                detail.push_str(&loaded.report.summarize(Severity::Warning));
            }
            CheckResult::pass(id, description).with_detail(detail)
        }
    };

    let catalog = &loaded.value;
    if catalog.is_empty() {
        let reason = "no skills loaded";
        return vec![
            parsed,
            CheckResult::skip("config.skill_files", "every skill file exists", reason),
            CheckResult::skip("config.unique_keywords", "magic keywords are unique", reason),
        ];
    }

    let missing: Vec<String> = catalog
        .iter()
        .filter(|(_, skill)| !ctx.paths.root.join(&skill.file).is_file())
        .map(|(name, skill)| format!("{name}: {}", skill.file.display()))
        .collect();
    let files = CheckResult::check(
        "config.skill_files",
        "every skill file exists",
        missing.is_empty(),
        format!("missing {}", missing.join(", ")),
    );

    let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (name, keyword, _) in catalog.magic_keywords() {
        owners.entry(keyword_base(keyword)).or_default().push(name);
    }
    let duplicates: Vec<String> = owners
        .iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(keyword, names)| format!("`{keyword}:` used by {}", names.join(", ")))
        .collect();
    let unique = CheckResult::check(
        "config.unique_keywords",
        "magic keywords are unique",
        duplicates.is_empty(),
        duplicates.join("; "),
    );

    vec![parsed, files, unique]
}

fn confirmation_keywords(ctx: &EvaluationContext) -> CheckResult {
    let mut report = ValidationReport::new();
    ctx.config.check_confirmation_keywords(&ctx.catalog, &mut report);
    with_warnings(
        CheckResult::pass(
            "config.confirmation_keywords",
            "confirmation gates name known keywords",
        ),
        &report,
    )
}

/// Configuration files parse and hold sane values
pub fn check(ctx: &EvaluationContext) -> Vec<CheckResult> {
    let mut results = vec![
        harness_config(ctx),
        CheckResult::check(
            "config.safe_mode",
            "safeMode is enabled",
            ctx.config.safe_mode,
            "safeMode is false",
        ),
        rules(ctx),
    ];
    results.extend(catalog_results(ctx));
    results.push(confirmation_keywords(ctx));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::CheckStatus;
    use crate::paths::ProjectPaths;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn status(results: &[CheckResult], id: &str) -> CheckStatus {
        results
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.status())
            .unwrap_or_else(|| panic!("no result {id}"))
    }

    fn write_json(dir: &TempDir, rel: &str, value: serde_json::Value) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, value.to_string()).unwrap();
    }

    #[test]
    fn test_missing_files_fail() {
        let dir = TempDir::new().unwrap();
        let results = check(&EvaluationContext::load(ProjectPaths::new(dir.path())));
        assert_eq!(status(&results, "config.harness_valid"), CheckStatus::Fail);
        assert_eq!(status(&results, "config.safe_mode"), CheckStatus::Pass);
        assert_eq!(status(&results, "config.rules_loaded"), CheckStatus::Fail);
        assert_eq!(status(&results, "config.skill_catalog"), CheckStatus::Fail);
        assert_eq!(status(&results, "config.skill_files"), CheckStatus::Skip);
    }

    #[test]
    fn test_duplicate_keywords_and_missing_skill_files() {
        let dir = TempDir::new().unwrap();
        write_json(
            &dir,
            "skills/skill-rules.json",
            json!({
                "a": { "file": "skills/a.md", "magicKeyword": "build:" },
                "b": { "file": "skills/b.md", "magicKeyword": "Build:" }
            }),
        );
        fs::write(dir.path().join("skills/a.md"), "").unwrap();

        let results = check(&EvaluationContext::load(ProjectPaths::new(dir.path())));
        assert_eq!(status(&results, "config.skill_catalog"), CheckStatus::Pass);
        assert_eq!(status(&results, "config.skill_files"), CheckStatus::Fail);
        assert_eq!(status(&results, "config.unique_keywords"), CheckStatus::Fail);
    }

    #[test]
    fn test_warnings_pass_with_detail() {
        let dir = TempDir::new().unwrap();
        write_json(
            &dir,
            "harness.config.json",
            json!({
                "version": "1.0", "safeMode": false, "theme": "dark",
                "restrictions": { "maxParallelAgents": 3, "autoFixRetries": 3, "requireConfirmation": [] }
            }),
        );
        let results = check(&EvaluationContext::load(ProjectPaths::new(dir.path())));
        let valid = results.iter().find(|r| r.id == "config.harness_valid").unwrap();
        assert!(valid.pass);
        assert!(valid.detail.as_deref().unwrap().contains("theme"));
        assert_eq!(status(&results, "config.safe_mode"), CheckStatus::Fail);
    }
}
