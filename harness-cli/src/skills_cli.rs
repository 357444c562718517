//! `harness skills`: list the skill catalog

use anyhow::Result;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use harness_core::config::{SkillCatalog, SkillDefinition};
use harness_core::ProjectPaths;

#[derive(Tabled)]
struct SkillTableRow {
    #[tabled(rename = "Skill")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Enforcement")]
    enforcement: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Keyword")]
    keyword: String,
    #[tabled(rename = "Triggers")]
    triggers: String,
    #[tabled(rename = "File")]
    file: String,
}

fn label(value: impl std::fmt::Debug) -> String {
    format!("{value:?}").to_lowercase()
}

impl SkillTableRow {
    fn new(name: &str, skill: &SkillDefinition) -> Self {
        let triggers = skill
            .prompt_triggers
            .as_ref()
            .filter(|t| !t.keywords.is_empty())
            .map(|t| t.keywords.join(", "))
            .unwrap_or_else(|| "-".to_string());

        Self {
            name: name.to_string(),
            kind: label(skill.kind),
            enforcement: label(skill.enforcement),
            priority: label(skill.priority),
            keyword: skill.magic_keyword.clone().unwrap_or_else(|| "-".to_string()),
            triggers,
            file: skill.file.display().to_string(),
        }
    }
}

pub fn skills_command(paths: &ProjectPaths, json: bool) -> Result<i32> {
    let loaded = SkillCatalog::load(&paths.skill_catalog);
    for issue in &loaded.report.issues {
        eprintln!("{:?} ({}): {}", issue.severity, issue.rule_id, issue.message);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.value)?);
        return Ok(0);
    }

    if loaded.value.is_empty() {
        println!(
            "No skills found in {}",
            paths.display_relative(&paths.skill_catalog)
        );
        return Ok(0);
    }

    let rows: Vec<SkillTableRow> = loaded
        .value
        .iter()
        .map(|(name, skill)| SkillTableRow::new(name, skill))
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("Found {} skills\n", rows.len());
    println!("{table}");
    Ok(0)
}
