//! Per-invocation evaluation context
//!
//! Every hook invocation is a fresh process. The context is loaded once from
//! disk at the start of a command and passed by reference to the guard, the
//! gate and the audit checks; nothing is cached across invocations.

use tracing::debug;

use crate::config::{ArchRules, HarnessConfig, SkillCatalog, ValidationReport};
use crate::paths::ProjectPaths;

#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub paths: ProjectPaths,
    pub config: HarnessConfig,
    pub rules: ArchRules,
    pub catalog: SkillCatalog,
    /// Problems found while loading, already degraded to defaults
    pub load_issues: ValidationReport,
}

impl EvaluationContext {
    /// Load all configuration for the project; never fails
    pub fn load(paths: ProjectPaths) -> Self {
        let config = HarnessConfig::load_or_default(&paths.harness_config);
        let rules = ArchRules::load(&paths.rules);
        let catalog = SkillCatalog::load(&paths.skill_catalog);

        debug!(
            "Loaded context for {:?}: config={:?} rules={:?} catalog={:?} ({} skills)",
            paths.root,
            config.source,
            rules.source,
            catalog.source,
            catalog.value.len()
        );

        let mut load_issues = config.report;
        load_issues.extend(rules.report);
        load_issues.extend(catalog.report);

        Self {
            paths,
            config: config.value,
            rules: rules.value,
            catalog: catalog.value,
            load_issues,
        }
    }

    /// Build a context from already-constructed parts
    pub fn new(
        paths: ProjectPaths,
        config: HarnessConfig,
        rules: ArchRules,
        catalog: SkillCatalog,
    ) -> Self {
        Self {
            paths,
            config,
            rules,
            catalog,
            load_issues: ValidationReport::new(),
        }
    }
}
