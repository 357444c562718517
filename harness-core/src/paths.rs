//! Project path resolution.
//!
//! Every file the engine reads or writes lives at a conventional location
//! under the project root. Resolving them all in one place keeps the guard,
//! the gate and the audit runner in agreement about where things are.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable set by Claude Code for hook processes
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Conventional project layout
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Root project directory
    pub root: PathBuf,
    /// Harness behavior config (harness.config.json)
    pub harness_config: PathBuf,
    /// Architecture rules (architecture/rules.json)
    pub rules: PathBuf,
    /// Skill catalog (skills/skill-rules.json)
    pub skill_catalog: PathBuf,
    /// Agent instructions (CLAUDE.md)
    pub claude_md: PathBuf,
    /// Claude Code settings with hook wiring (.claude/settings.json)
    pub settings: PathBuf,
    /// Hook scripts directory (hooks/)
    pub hooks_dir: PathBuf,
    /// PreToolUse hook for Bash (hooks/pre-bash.sh)
    pub bash_hook: PathBuf,
    /// PreToolUse hook for Edit/Write (hooks/protect-paths.sh)
    pub file_hook: PathBuf,
    /// UserPromptSubmit hook (hooks/magic-keywords.sh)
    pub prompt_hook: PathBuf,
    /// External source-of-truth resolver (hooks/prd-resolver.sh)
    pub prd_resolver: PathBuf,
    /// Operational lessons (memory/MISTAKES.md)
    pub mistakes: PathBuf,
    /// Architecture decisions (memory/DECISIONS.md)
    pub decisions: PathBuf,
    /// Append-only activation log (logs/skill-activations.log)
    pub activation_log: PathBuf,
}

impl ProjectPaths {
    /// Build the layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let hooks_dir = root.join("hooks");
        ProjectPaths {
            harness_config: root.join("harness.config.json"),
            rules: root.join("architecture").join("rules.json"),
            skill_catalog: root.join("skills").join("skill-rules.json"),
            claude_md: root.join("CLAUDE.md"),
            settings: root.join(".claude").join("settings.json"),
            bash_hook: hooks_dir.join("pre-bash.sh"),
            file_hook: hooks_dir.join("protect-paths.sh"),
            prompt_hook: hooks_dir.join("magic-keywords.sh"),
            prd_resolver: hooks_dir.join("prd-resolver.sh"),
            mistakes: root.join("memory").join("MISTAKES.md"),
            decisions: root.join("memory").join("DECISIONS.md"),
            activation_log: root.join("logs").join("skill-activations.log"),
            hooks_dir,
            root,
        }
    }

    /// Resolve the project root
    ///
    /// Resolution order:
    /// 1. Explicit override (CLI `--project-dir`)
    /// 2. `CLAUDE_PROJECT_DIR` from the environment
    /// 3. The current working directory
    pub fn discover(explicit: Option<&Path>) -> std::io::Result<Self> {
        if let Some(dir) = explicit {
            debug!("Using explicit project dir: {:?}", dir);
            return Ok(Self::new(dir));
        }

        if let Some(dir) = std::env::var_os(PROJECT_DIR_ENV).filter(|v| !v.is_empty()) {
            debug!("Using {} = {:?}", PROJECT_DIR_ENV, dir);
            return Ok(Self::new(PathBuf::from(dir)));
        }

        let cwd = std::env::current_dir()?;
        debug!("Using current directory as project root: {:?}", cwd);
        Ok(Self::new(cwd))
    }

    /// Path relative to the root, for display
    pub fn display_relative<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        match path.strip_prefix(&self.root) {
            Ok(rel) => std::borrow::Cow::Owned(rel.to_string_lossy().into_owned()),
            Err(_) => path.to_string_lossy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_layout_is_rooted() {
        let paths = ProjectPaths::new("/work/project");
        assert_eq!(
            paths.rules,
            PathBuf::from("/work/project/architecture/rules.json")
        );
        assert_eq!(
            paths.bash_hook,
            PathBuf::from("/work/project/hooks/pre-bash.sh")
        );
        assert_eq!(
            paths.activation_log,
            PathBuf::from("/work/project/logs/skill-activations.log")
        );
    }

    #[test]
    fn test_display_relative() {
        let paths = ProjectPaths::new("/work/project");
        assert_eq!(paths.display_relative(&paths.settings), ".claude/settings.json");
        assert_eq!(paths.display_relative(Path::new("/etc/hosts")), "/etc/hosts");
    }

    #[test]
    #[serial]
    fn test_explicit_override_wins() {
        std::env::set_var(PROJECT_DIR_ENV, "/from/env");
        let paths = ProjectPaths::discover(Some(Path::new("/from/flag"))).unwrap();
        assert_eq!(paths.root, PathBuf::from("/from/flag"));
        std::env::remove_var(PROJECT_DIR_ENV);
    }

    #[test]
    #[serial]
    fn test_env_used_without_override() {
        std::env::set_var(PROJECT_DIR_ENV, "/from/env");
        let paths = ProjectPaths::discover(None).unwrap();
        assert_eq!(paths.root, PathBuf::from("/from/env"));
        std::env::remove_var(PROJECT_DIR_ENV);
    }
}
