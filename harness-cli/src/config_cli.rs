//! Configuration CLI commands
//!
//! `harness config validate` checks harness.config.json strictly: a missing
//! or unparsable file is an error here, unlike the hooks which fall back to
//! defaults.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use harness_core::config::validation::{ValidationReport, VALIDATE_ERRORS};
use harness_core::config::{HarnessConfig, Severity};
use harness_core::{EvaluationContext, ProjectPaths};

#[derive(Parser, Debug)]
pub enum ConfigCommand {
    /// Validate harness.config.json (exit 0 valid, 1 errors, 2 warnings only)
    Validate {
        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command, returning the process exit code
    pub fn execute(&self, paths: ProjectPaths) -> Result<i32> {
        match self {
            ConfigCommand::Validate { json } => validate(paths, *json),
        }
    }
}

fn validate(paths: ProjectPaths, json: bool) -> Result<i32> {
    info!("Validating {:?}", paths.harness_config);

    let mut report = match HarnessConfig::validate_file(&paths.harness_config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ {}", paths.display_relative(&paths.harness_config));
            eprintln!("  ERROR: {e}");
            return Ok(VALIDATE_ERRORS);
        }
    };

    // Cross-check confirmation gates against the catalog the gate will use
    let ctx = EvaluationContext::load(paths);
    ctx.config.check_confirmation_keywords(&ctx.catalog, &mut report);

    if json {
        let output = serde_json::json!({
            "path": ctx.paths.harness_config.display().to_string(),
            "valid": !report.has_errors(),
            "total_errors": report.error_count(),
            "total_warnings": report.warning_count(),
            "issues": report.issues,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_validation_results(&ctx.paths.display_relative(&ctx.paths.harness_config), &report);
    }

    Ok(report.exit_code())
}

fn print_validation_results(name: &str, report: &ValidationReport) {
    if report.is_clean() {
        println!("✓ {name}");
    } else if report.has_errors() {
        println!("✗ {name}");
    } else {
        println!("⚠ {name}");
    }

    for issue in &report.issues {
        let label = match issue.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        println!("  {label} ({}): {}", issue.rule_id, issue.message);
    }

    println!();
    if report.is_clean() {
        println!("✅ Configuration is valid!");
    } else {
        println!(
            "{} errors, {} warnings",
            report.error_count(),
            report.warning_count()
        );
    }
}
