//! Magic-keyword gate for UserPromptSubmit
//!
//! A prompt containing a configured keyword (`build:`, `deploy:`) binds the
//! agent to one skill. Keywords listed under
//! `restrictions.requireConfirmation` stop the prompt until a human
//! confirms. Otherwise the gate assembles context for the agent: the source
//! of truth, the binding directive and recent memory, and records the
//! activation. Without a keyword, skills whose trigger words overlap the
//! prompt are suggested.

pub mod activation;
pub mod inject;
pub mod matcher;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::best_effort::BestEffort;
use crate::config::harness::keyword_base;
use crate::context::EvaluationContext;
use crate::decision::{Decision, Diagnostic};
use activation::Activation;
use matcher::{find_magic_keyword, suggest_skills};

/// Result of gating one prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub decision: Decision,
    /// Written to stdout for the agent to read
    pub context: Vec<String>,
    /// Written to stderr
    pub diagnostics: Vec<Diagnostic>,
    /// Recorded activation, when one was logged
    pub activation: Option<Activation>,
}

impl GateOutcome {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            context: Vec::new(),
            diagnostics: Vec::new(),
            activation: None,
        }
    }

    pub fn block(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            decision: Decision::Block,
            context: Vec::new(),
            diagnostics,
            activation: None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.decision.exit_code()
    }

    /// Context text as written to stdout
    pub fn context_text(&self) -> String {
        self.context.join("\n\n")
    }
}

/// Extract `prompt` from a UserPromptSubmit payload
pub fn prompt_from_input(raw: &str) -> Result<Option<String>, String> {
    let Some(payload) = crate::guard::parse_payload(raw)? else {
        return Ok(None);
    };
    payload
        .get("prompt")
        .and_then(Value::as_str)
        .map(|prompt| Some(prompt.to_string()))
        .ok_or_else(|| "hook input has no string `prompt`".to_string())
}

/// Gate a UserPromptSubmit payload read from stdin
pub fn evaluate_gate_input(raw_stdin: &str, ctx: &EvaluationContext) -> GateOutcome {
    match prompt_from_input(raw_stdin) {
        Ok(Some(prompt)) => evaluate_prompt(&prompt, ctx),
        Ok(None) => {
            debug!("Empty hook input, nothing to gate");
            GateOutcome::allow()
        }
        Err(reason) => GateOutcome::block(vec![Diagnostic::block(format!(
            "Could not read the prompt to check: {reason}"
        ))]),
    }
}

/// Gate one prompt
pub fn evaluate_prompt(prompt: &str, ctx: &EvaluationContext) -> GateOutcome {
    let Some(hit) = find_magic_keyword(prompt, &ctx.catalog) else {
        return suggest(prompt, ctx);
    };

    let base = keyword_base(hit.keyword);

    if ctx.config.restrictions.requires_confirmation(hit.keyword) {
        info!("Keyword `{}` requires confirmation, blocking prompt", hit.keyword);
        return GateOutcome::block(vec![
            Diagnostic::block(format!(
                "`{}` requires explicit human confirmation before it can run.",
                hit.keyword
            )),
            Diagnostic::info(format!(
                "Do not start any `{base}` work. Ask the user to confirm this request, and resubmit it only after they have confirmed."
            )),
            Diagnostic::info(
                "Confirmation gates are configured in harness.config.json under restrictions.requireConfirmation.",
            ),
        ]);
    }

    let mut outcome = GateOutcome::allow();
    outcome.context.push(format!(
        "Magic keyword `{}` activated `{}`.",
        hit.keyword, hit.skill
    ));
    outcome
        .context
        .push(inject::source_of_truth(&ctx.paths, &base, prompt));
    outcome
        .context
        .push(inject::directive(hit.skill, hit.definition));
    if let Some(excerpt) = inject::memory_excerpt(&ctx.paths, &base) {
        outcome.context.push(excerpt);
    }

    let record = Activation::new(hit.skill, hit.keyword, prompt);
    match activation::append(&ctx.paths.activation_log, &record) {
        BestEffort::Done(()) => outcome.activation = Some(record),
        other => {
            let reason = other.reason().unwrap_or("unknown error");
            warn!("Activation not logged: {}", reason);
            outcome
                .diagnostics
                .push(Diagnostic::warn(format!("Activation not logged: {reason}")));
        }
    }

    outcome
}

fn suggest(prompt: &str, ctx: &EvaluationContext) -> GateOutcome {
    let mut outcome = GateOutcome::allow();
    for suggestion in suggest_skills(prompt, &ctx.catalog) {
        let Some(skill) = ctx.catalog.get(&suggestion.skill) else {
            continue;
        };
        let keyword = skill
            .magic_keyword
            .as_deref()
            .map(|k| format!(" Start the prompt with `{k}` to bind it."))
            .unwrap_or_default();
        outcome.context.push(format!(
            "Suggested skill: `{}` ({}), matched {}.{}",
            suggestion.skill,
            skill.file.display(),
            suggestion.matched.join(", "),
            keyword
        ));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchRules, HarnessConfig, SkillCatalog};
    use crate::paths::ProjectPaths;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> EvaluationContext {
        let catalog = SkillCatalog::from_value(&json!({
            "builder": {
                "type": "agent", "enforcement": "require", "file": "agents/builder.md",
                "magicKeyword": "build:",
                "promptTriggers": { "keywords": ["implement", "feature"] }
            },
            "deployer": { "type": "agent", "file": "agents/deployer.md", "magicKeyword": "deploy:" },
            "fixer": { "type": "skill", "file": "skills/fixer.md", "magicKeyword": "fix:" }
        }))
        .0;
        EvaluationContext::new(
            ProjectPaths::new(dir.path()),
            HarnessConfig::default(),
            ArchRules::default(),
            catalog,
        )
    }

    #[test]
    fn test_confirmation_blocks_without_logging() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let outcome = evaluate_prompt("deploy: push to prod", &ctx);
        assert_eq!(outcome.exit_code(), 2);
        assert!(outcome.context.is_empty());
        assert!(outcome.diagnostics[0].message.contains("deploy:"));
        assert!(!ctx.paths.activation_log.exists());
    }

    #[test]
    fn test_activation_binds_and_logs() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let outcome = evaluate_prompt("build: add feature", &ctx);

        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.context_text().contains("BINDING: Use the `builder` agent"));
        assert!(outcome.context_text().contains("Source of truth unavailable"));

        let log = fs::read_to_string(&ctx.paths.activation_log).unwrap();
        assert!(log.trim_end().ends_with("|builder|build:|build: add feature"));
        assert_eq!(outcome.activation.unwrap().skill, "builder");
    }

    #[test]
    fn test_memory_excerpt_for_fix() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        fs::create_dir_all(dir.path().join("memory")).unwrap();
        fs::write(&ctx.paths.mistakes, "- never skip the migration check\n").unwrap();

        let outcome = evaluate_prompt("fix: the login crash", &ctx);
        assert!(outcome
            .context_text()
            .contains("Recent entries from memory/MISTAKES.md:\n- never skip the migration check"));
    }

    #[test]
    fn test_no_keyword_suggests_only() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let outcome = evaluate_prompt("implement the search feature", &ctx);
        assert_eq!(outcome.decision, Decision::Allow);
        assert_eq!(outcome.context.len(), 1);
        assert!(outcome.context[0].contains("`builder`"));
        assert!(!ctx.paths.activation_log.exists());
    }

    #[test]
    fn test_input_contract() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        assert_eq!(evaluate_gate_input("", &ctx), GateOutcome::allow());
        assert_eq!(evaluate_gate_input("not json", &ctx).exit_code(), 2);
        assert_eq!(evaluate_gate_input(r#"{"session_id":"x"}"#, &ctx).exit_code(), 2);
        assert_eq!(
            evaluate_gate_input(r#"{"prompt":"build: add feature"}"#, &ctx).exit_code(),
            0
        );
    }

    #[test]
    fn test_log_failure_degrades_to_warning() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        fs::write(dir.path().join("logs"), "").unwrap();

        let outcome = evaluate_prompt("build: add feature", &ctx);
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(outcome.activation.is_none());
        assert_eq!(outcome.diagnostics.len(), 1);
    }
}
