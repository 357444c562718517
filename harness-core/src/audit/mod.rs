//! Checklist-based audit runner
//!
//! A [`Checklist`] is an ordered list of named sections, each a function
//! that inspects some context and returns [`CheckResult`]s. The runner walks
//! `Pending → RunningSection(i) → Aggregating → Done`, tallies results, and
//! fails the audit when any check failed. Skipped checks count toward
//! neither side.
//!
//! The runner does not distinguish static checks from the ones that execute
//! hook scripts; see [`checks`] for the standard sections.

pub mod checks;

use serde::Serialize;
use tracing::{debug, info};

use crate::context::EvaluationContext;

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub id: String,
    pub description: String,
    pub pass: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

impl CheckResult {
    pub fn pass(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            pass: true,
            skip: None,
            detail: None,
        }
    }

    pub fn fail(
        id: impl Into<String>,
        description: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            pass: false,
            skip: None,
            detail: Some(detail.into()),
        }
    }

    pub fn skip(
        id: impl Into<String>,
        description: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            pass: false,
            skip: Some(true),
            detail: Some(reason.into()),
        }
    }

    /// Pass or fail depending on `ok`
    pub fn check(
        id: impl Into<String>,
        description: impl Into<String>,
        ok: bool,
        failure: impl Into<String>,
    ) -> Self {
        if ok {
            Self::pass(id, description)
        } else {
            Self::fail(id, description, failure)
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Override the verdict, keeping id, description and detail
    pub fn passing(mut self, ok: bool) -> Self {
        self.pass = ok;
        self
    }

    pub fn status(&self) -> CheckStatus {
        if self.skip == Some(true) {
            CheckStatus::Skip
        } else if self.pass {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }
}

/// Where the runner is in its walk over the checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    Pending,
    RunningSection(usize),
    Aggregating,
    Done,
}

type CheckFn<C> = Box<dyn Fn(&C) -> Vec<CheckResult>>;

struct Section<C> {
    name: String,
    check: CheckFn<C>,
}

/// Ordered sections of checks over a context `C`
pub struct Checklist<C> {
    sections: Vec<Section<C>>,
}

impl<C> Default for Checklist<C> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
        }
    }
}

impl<C> Checklist<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section
    pub fn section(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&C) -> Vec<CheckResult> + 'static,
    ) -> Self {
        self.sections.push(Section {
            name: name.into(),
            check: Box::new(check),
        });
        self
    }

    pub fn run(&self, ctx: &C) -> AuditReport {
        self.run_observed(ctx, |_| {})
    }

    /// Run every section in order, reporting each state transition
    pub fn run_observed(&self, ctx: &C, mut observe: impl FnMut(AuditState)) -> AuditReport {
        let mut state = AuditState::Pending;
        observe(state);

        let mut report = AuditReport::default();
        for (index, section) in self.sections.iter().enumerate() {
            state = AuditState::RunningSection(index);
            observe(state);
            debug!("Running audit section {} ({})", index, section.name);

            let results = (section.check)(ctx);
            report.sections.push(SectionReport {
                name: section.name.clone(),
                results,
            });
        }

        state = AuditState::Aggregating;
        observe(state);
        for result in report.sections.iter().flat_map(|s| &s.results) {
            match result.status() {
                CheckStatus::Pass => report.summary.passed += 1,
                CheckStatus::Fail => report.summary.failed += 1,
                CheckStatus::Skip => report.summary.skipped += 1,
            }
        }
        report.exit_code = if report.summary.failed > 0 { 1 } else { 0 };

        state = AuditState::Done;
        observe(state);
        info!(
            "Audit finished: {} passed, {} failed, {} skipped",
            report.summary.passed, report.summary.failed, report.summary.skipped
        );
        report
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub name: String,
    pub results: Vec<CheckResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub sections: Vec<SectionReport>,
    pub summary: Summary,
    /// 1 when any check failed, else 0
    pub exit_code: i32,
}

impl AuditReport {
    pub fn summary_line(&self) -> String {
        format!(
            "{} passed, {} failed, {} skipped",
            self.summary.passed, self.summary.failed, self.summary.skipped
        )
    }

    /// Human-readable report, grouped by section
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&section.name);
            out.push('\n');
            for result in &section.results {
                let mark = match result.status() {
                    CheckStatus::Pass => "✓",
                    CheckStatus::Fail => "✗",
                    CheckStatus::Skip => "-",
                };
                out.push_str(&format!("  {mark} {}", result.description));
                if let Some(detail) = &result.detail {
                    out.push_str(&format!(" ({detail})"));
                }
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(&self.summary_line());
        out.push('\n');
        out
    }
}

/// The standard harness checklist, in order
pub fn standard_checklist() -> Checklist<EvaluationContext> {
    Checklist::new()
        .section("structure", checks::structure::check)
        .section("config", checks::config::check)
        .section("protection", checks::protection::check)
        .section("hooks", checks::hooks::check)
        .section("enforcement", checks::enforcement::check)
        .section("tooling", checks::tooling::check)
}

/// Run the standard checklist against a project
pub fn run_audit(ctx: &EvaluationContext) -> AuditReport {
    standard_checklist().run(ctx)
}
