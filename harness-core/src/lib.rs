//! Harness policy mediation library
//!
//! Sits between a coding agent and the project it works on. Every tool call
//! and prompt passes through one of three guards before it takes effect:
//!
//! - [`guard::evaluate_bash`] screens shell commands for network-to-shell
//!   pipes, unreviewed installs and writes into protected paths
//! - [`guard::evaluate_file_edit`] blocks edits under protected prefixes
//! - [`gate::evaluate_prompt`] binds prompts that open with a magic keyword
//!   to the skill that owns it
//!
//! [`audit::run_audit`] checks that a project is wired to actually enforce
//! all of the above.

pub mod audit;
pub mod best_effort;
pub mod canonical;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod gate;
pub mod guard;
pub mod paths;
pub mod process;
pub mod protection;

pub use audit::{run_audit, AuditReport, CheckResult};
pub use best_effort::BestEffort;
pub use context::EvaluationContext;
pub use decision::{Decision, Diagnostic, GuardOutcome, Level, EXIT_ALLOW, EXIT_BLOCK};
pub use error::{HarnessError, Result};
pub use gate::GateOutcome;
pub use paths::ProjectPaths;
