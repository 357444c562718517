//! Magic keyword matching and trigger-word suggestions

use regex::RegexBuilder;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{Priority, SkillCatalog, SkillDefinition};

/// Distinct trigger words needed before a skill is suggested
pub const MIN_TRIGGER_MATCHES: usize = 2;

/// A magic keyword found in a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch<'a> {
    pub skill: &'a str,
    /// Keyword as configured, e.g. `build:`
    pub keyword: &'a str,
    /// Byte offset in the lowercased prompt
    pub position: usize,
    pub definition: &'a SkillDefinition,
}

/// Byte offset of the first standalone occurrence of `keyword` in `haystack`
///
/// Both arguments must already be lowercased. The keyword must start the
/// text or follow whitespace, and must be followed by whitespace.
fn standalone_position(haystack: &str, keyword: &str) -> Option<usize> {
    haystack.match_indices(keyword).map(|(i, _)| i).find(|&i| {
        let before_ok = haystack[..i]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        let after_ok = haystack[i + keyword.len()..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);
        before_ok && after_ok
    })
}

/// The magic keyword that activates for `prompt`, if any
///
/// When several keywords appear, the earliest one wins. Ties at the same
/// position go to the higher priority skill, then to the skill name.
pub fn find_magic_keyword<'a>(prompt: &str, catalog: &'a SkillCatalog) -> Option<KeywordMatch<'a>> {
    let lowered = prompt.to_lowercase();

    let best = catalog
        .magic_keywords()
        .filter_map(|(skill, keyword, definition)| {
            let needle = keyword.trim().to_lowercase();
            if needle.is_empty() {
                return None;
            }
            standalone_position(&lowered, &needle).map(|position| KeywordMatch {
                skill,
                keyword,
                position,
                definition,
            })
        })
        .min_by(|a, b| {
            (a.position, a.definition.priority, a.skill).cmp(&(
                b.position,
                b.definition.priority,
                b.skill,
            ))
        });

    match &best {
        Some(hit) => debug!("Magic keyword `{}` matched skill `{}`", hit.keyword, hit.skill),
        None => trace!("No magic keyword in prompt"),
    }
    best
}

/// A skill whose trigger words overlap the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub skill: String,
    pub priority: Priority,
    /// Distinct trigger words found, lowercased, in catalog order
    pub matched: Vec<String>,
}

fn contains_word(prompt: &str, word: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(word));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(prompt),
        Err(e) => {
            debug!("Skipping trigger {:?}: {}", word, e);
            false
        }
    }
}

/// Skills with at least [`MIN_TRIGGER_MATCHES`] distinct trigger words in
/// the prompt, best first
pub fn suggest_skills(prompt: &str, catalog: &SkillCatalog) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = catalog
        .iter()
        .filter_map(|(name, skill)| {
            let triggers = skill.prompt_triggers.as_ref()?;
            let mut matched: Vec<String> = Vec::new();
            for trigger in &triggers.keywords {
                let word = trigger.trim().to_lowercase();
                if word.is_empty() || matched.contains(&word) {
                    continue;
                }
                if contains_word(prompt, &word) {
                    matched.push(word);
                }
            }
            (matched.len() >= MIN_TRIGGER_MATCHES).then(|| Suggestion {
                skill: name.to_string(),
                priority: skill.priority,
                matched,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.matched
            .len()
            .cmp(&a.matched.len())
            .then(a.priority.cmp(&b.priority))
            .then(a.skill.cmp(&b.skill))
    });
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> SkillCatalog {
        SkillCatalog::from_value(&json!({
            "builder": {
                "type": "agent", "file": "agents/builder.md", "priority": "medium",
                "magicKeyword": "build:",
                "promptTriggers": { "keywords": ["implement", "feature", "component"] }
            },
            "deployer": {
                "type": "agent", "file": "agents/deployer.md", "priority": "high",
                "magicKeyword": "deploy:"
            },
            "fixer": {
                "type": "skill", "file": "skills/fixer.md", "priority": "high",
                "magicKeyword": "fix:",
                "promptTriggers": { "keywords": ["bug", "crash", "error", "Bug"] }
            }
        }))
        .0
    }

    #[test]
    fn test_keyword_at_start() {
        let catalog = catalog();
        let hit = find_magic_keyword("build: add login page", &catalog).unwrap();
        assert_eq!(hit.skill, "builder");
        assert_eq!(hit.keyword, "build:");
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let catalog = catalog();
        assert_eq!(find_magic_keyword("BUILD: x", &catalog).unwrap().skill, "builder");
        assert_eq!(find_magic_keyword("please Fix: the crash", &catalog).unwrap().skill, "fixer");
    }

    #[test]
    fn test_substrings_do_not_match() {
        let catalog = catalog();
        assert!(find_magic_keyword("builder pattern implementation", &catalog).is_none());
        assert!(find_magic_keyword("rebuild: everything", &catalog).is_none());
        assert!(find_magic_keyword("build:now", &catalog).is_none());
        assert!(find_magic_keyword("build:", &catalog).is_none());
    }

    #[test]
    fn test_earliest_keyword_wins() {
        let catalog = catalog();
        let hit = find_magic_keyword("fix: then build: later", &catalog).unwrap();
        assert_eq!(hit.skill, "fixer");
        let hit = find_magic_keyword("build: after fix: first", &catalog).unwrap();
        assert_eq!(hit.skill, "builder");
    }

    #[test]
    fn test_suggestion_needs_two_distinct_triggers() {
        let catalog = catalog();
        assert!(suggest_skills("implement the login", &catalog).is_empty());

        let suggestions = suggest_skills("Implement a new feature for checkout", &catalog);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].skill, "builder");
        assert_eq!(suggestions[0].matched, vec!["implement", "feature"]);
    }

    #[test]
    fn test_duplicate_triggers_count_once() {
        let catalog = catalog();
        // `bug` and `Bug` are the same trigger
        assert!(suggest_skills("a bug, another bug", &catalog).is_empty());
        assert_eq!(suggest_skills("bug causes a crash", &catalog)[0].skill, "fixer");
    }

    #[test]
    fn test_triggers_match_whole_words() {
        let catalog = catalog();
        assert!(suggest_skills("debugging crashes in components", &catalog).is_empty());
    }
}
