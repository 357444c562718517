//! Hook decisions and the diagnostics that accompany them.
//!
//! Hook frameworks only see an exit code and text, so a decision is carried
//! as a [`Decision`] plus an ordered list of [`Diagnostic`] lines. The binary
//! decides which stream each list is written to.

use serde::Serialize;
use std::fmt;

/// Exit code for an allowed action
pub const EXIT_ALLOW: i32 = 0;

/// Exit code for a blocked action (the Claude Code hook contract)
pub const EXIT_BLOCK: i32 = 2;

/// Final allow/block verdict for one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Block,
}

impl Decision {
    pub fn exit_code(self) -> i32 {
        match self {
            Decision::Allow => EXIT_ALLOW,
            Decision::Block => EXIT_BLOCK,
        }
    }
}

/// Severity of a diagnostic line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// The reason an action was blocked
    Block,
    /// Observational: allowed, but worth a human's attention
    Warn,
    /// An audited exception or other note
    Notice,
    /// Guidance only
    Info,
}

/// One line of diagnostic text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn block(message: impl Into<String>) -> Self {
        Self {
            level: Level::Block,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            message: message.into(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            level: Level::Notice,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Block => write!(f, "BLOCKED: {}", self.message),
            Level::Warn => write!(f, "WARNING: {}", self.message),
            Level::Notice => write!(f, "NOTICE: {}", self.message),
            Level::Info => write!(f, "{}", self.message),
        }
    }
}

/// Result of running a guard over one hook event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardOutcome {
    pub decision: Decision,
    /// Written to stderr, never stdout
    pub diagnostics: Vec<Diagnostic>,
}

impl GuardOutcome {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            diagnostics: Vec::new(),
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Block,
            diagnostics: vec![Diagnostic::block(reason)],
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.decision.exit_code()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Append a block reason and flip the decision
    pub fn deny(&mut self, reason: impl Into<String>) {
        self.decision = Decision::Block;
        self.diagnostics.push(Diagnostic::block(reason));
    }

    pub fn has_level(&self, level: Level) -> bool {
        self.diagnostics.iter().any(|d| d.level == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Decision::Allow.exit_code(), 0);
        assert_eq!(Decision::Block.exit_code(), 2);
    }

    #[test]
    fn test_deny_flips_decision() {
        let mut outcome = GuardOutcome::allow();
        outcome.push(Diagnostic::warn("package install"));
        assert_eq!(outcome.exit_code(), 0);

        outcome.deny("protected path");
        assert_eq!(outcome.exit_code(), 2);
        assert!(outcome.has_level(Level::Warn));
        assert!(outcome.has_level(Level::Block));
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(Diagnostic::block("x").to_string(), "BLOCKED: x");
        assert_eq!(Diagnostic::warn("x").to_string(), "WARNING: x");
        assert_eq!(Diagnostic::info("x").to_string(), "x");
    }
}
