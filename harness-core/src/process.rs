//! Blocking subprocess execution with explicit timeouts.
//!
//! The engine is synchronous, but hook scripts and the PRD resolver are
//! external programs that may hang. Each call spins up a current-thread
//! tokio runtime, runs the child with `tokio::time::timeout`, and kills it
//! when the deadline passes. Timeouts and spawn failures come back as
//! [`BestEffort::Failed`], never as panics or errors.
//!
//! Children run with `CLAUDE_PROJECT_DIR` set to their working directory,
//! the same environment Claude Code gives hook scripts.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use crate::best_effort::BestEffort;
use crate::paths::PROJECT_DIR_ENV;

/// Timeout for generic shell invocations (hook scripts in the audit)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for latency-sensitive lookups (PRD resolver, `command -v`)
pub const QUICK_TIMEOUT: Duration = Duration::from_secs(5);

/// Shell used to run hook scripts and inline commands
pub const SHELL: &str = "sh";

/// Captured result of a finished child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit code rendered for reports (`signal` when there is none)
    pub fn status_label(&self) -> String {
        match self.status {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}

/// Run `program args...` in `cwd`, feeding `stdin` if given
pub fn run(
    program: &str,
    args: &[&str],
    stdin: Option<&str>,
    cwd: &Path,
    timeout: Duration,
) -> BestEffort<CommandOutput> {
    debug!("Running {} {:?} (timeout {}s)", program, args, timeout.as_secs());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return BestEffort::failed(format!("could not start process runtime: {e}")),
    };

    runtime.block_on(run_async(program, args, stdin, cwd, timeout))
}

/// Run a script file through the shell
pub fn run_script(
    script: &Path,
    args: &[&str],
    stdin: Option<&str>,
    cwd: &Path,
    timeout: Duration,
) -> BestEffort<CommandOutput> {
    if !script.is_file() {
        return BestEffort::skipped(format!("{} not found", script.display()));
    }

    let script = script.to_string_lossy();
    let mut full_args = Vec::with_capacity(args.len() + 1);
    full_args.push(script.as_ref());
    full_args.extend_from_slice(args);
    run(SHELL, &full_args, stdin, cwd, timeout)
}

/// Whether `name` resolves as a command (`command -v`)
pub fn command_exists(name: &str, cwd: &Path) -> BestEffort<bool> {
    let probe = format!("command -v {}", shell_words::quote(name));
    run(SHELL, &["-c", &probe], None, cwd, QUICK_TIMEOUT).map(|output| output.success())
}

async fn run_async(
    program: &str,
    args: &[&str],
    stdin: Option<&str>,
    cwd: &Path,
    timeout: Duration,
) -> BestEffort<CommandOutput> {
    let mut command = tokio::process::Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .env(PROJECT_DIR_ENV, cwd)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return BestEffort::failed(format!("failed to start {program}: {e}")),
    };

    let input = stdin.map(str::to_owned);
    let finished = tokio::time::timeout(timeout, async move {
        if let (Some(input), Some(mut pipe)) = (input, child.stdin.take()) {
            // A child that never reads stdin closes the pipe early; that is not an error
            if let Err(e) = pipe.write_all(input.as_bytes()).await {
                trace!("stdin write to child ended early: {}", e);
            }
            drop(pipe);
        }
        child.wait_with_output().await
    })
    .await;

    match finished {
        Ok(Ok(output)) => {
            let result = CommandOutput {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            trace!("{} exited with {}", program, result.status_label());
            BestEffort::Done(result)
        }
        Ok(Err(e)) => BestEffort::failed(format!("failed waiting for {program}: {e}")),
        Err(_) => BestEffort::failed(format!(
            "{program} timed out after {}s",
            timeout.as_secs()
        )),
    }
}
