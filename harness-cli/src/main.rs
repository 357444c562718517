//! Harness - policy mediation for coding agents
//!
//! Entry point for the hook scripts and the audit. Hook subcommands read the
//! Claude Code payload from stdin and answer with an exit code: 0 allows,
//! 2 blocks. stdout carries only gate context and reports; everything else
//! goes to stderr.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use harness_core::decision::Diagnostic;
use harness_core::{audit, gate, guard, EvaluationContext, ProjectPaths, EXIT_BLOCK};

mod config_cli;
mod skills_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "harness",
    about = "Policy mediation for coding agents: command guard, protected paths, keyword gate and audit",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Project root (defaults to the current directory)
    #[clap(long, env = "CLAUDE_PROJECT_DIR", global = true)]
    project_dir: Option<PathBuf>,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

#[derive(Parser, Debug)]
enum Command {
    /// Evaluate a PreToolUse payload from stdin (exit 0 allow, 2 block)
    Guard {
        #[clap(value_enum)]
        tool: GuardTool,
    },

    /// Evaluate a prompt; context for the agent is printed to stdout
    Gate {
        /// Prompt text; read as a UserPromptSubmit payload from stdin when omitted
        prompt: Option<String>,
    },

    /// Run the audit checklist against the project (exit 1 on any failure)
    Audit {
        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Inspect and validate configuration
    Config {
        #[clap(subcommand)]
        command: config_cli::ConfigCommand,
    },

    /// List skills from skills/skill-rules.json
    Skills {
        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },
}

/// Which PreToolUse guard to run
#[derive(Debug, Clone, Copy, ValueEnum)]
enum GuardTool {
    /// Bash commands
    Bash,
    /// Edit, Write, MultiEdit and NotebookEdit
    File,
}

/// Initialize tracing with CLI flags
///
/// `RUST_LOG` takes precedence over --log-level when set.
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    // Logs MUST go to stderr; stdout belongs to the agent
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    let is_hook = matches!(cli.command, Command::Guard { .. } | Command::Gate { .. });
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            if is_hook {
                // A hook that cannot evaluate must not allow
                eprintln!("{}", Diagnostic::block(format!("{e:#}")));
                EXIT_BLOCK
            } else {
                eprintln!("Error: {e:#}");
                1
            }
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let paths = ProjectPaths::discover(cli.project_dir.as_deref())
        .context("Failed to determine the project directory")?;
    debug!("Project root: {:?}", paths.root);

    match cli.command {
        Command::Guard { tool } => guard_command(paths, tool),
        Command::Gate { prompt } => gate_command(paths, prompt),
        Command::Audit { json } => audit_command(paths, json),
        Command::Config { command } => command.execute(paths),
        Command::Skills { json } => skills_cli::skills_command(&paths, json),
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read hook event from stdin")?;
    Ok(buffer)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}

fn guard_command(paths: ProjectPaths, tool: GuardTool) -> Result<i32> {
    let input = read_stdin()?;
    let ctx = EvaluationContext::load(paths);

    let outcome = match tool {
        GuardTool::Bash => guard::evaluate_bash(&input, &ctx),
        GuardTool::File => guard::evaluate_file_edit(&input, &ctx),
    };

    debug!("Guard decision: {:?}", outcome.decision);
    print_diagnostics(&outcome.diagnostics);
    Ok(outcome.exit_code())
}

fn gate_command(paths: ProjectPaths, prompt: Option<String>) -> Result<i32> {
    let ctx = EvaluationContext::load(paths);

    let outcome = match prompt {
        Some(prompt) => gate::evaluate_prompt(&prompt, &ctx),
        None => gate::evaluate_gate_input(&read_stdin()?, &ctx),
    };

    let context = outcome.context_text();
    if !context.is_empty() {
        println!("{context}");
    }
    print_diagnostics(&outcome.diagnostics);
    Ok(outcome.exit_code())
}

fn audit_command(paths: ProjectPaths, json: bool) -> Result<i32> {
    let ctx = EvaluationContext::load(paths);
    for issue in &ctx.load_issues.issues {
        debug!("Config issue ({}): {}", issue.rule_id, issue.message);
    }

    let report = audit::run_audit(&ctx);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(report.exit_code)
}
