//! Running external transform commands.
use anyhow::{Context, Result, bail};
use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

fn check(result: ExecResult, label: &str) -> Result<ExecResult> {
    if !result.success {
        bail!(
            "{label} failed (exit {}): {}",
            result.code.unwrap_or(-1),
            result.stderr.trim()
        );
    }
    Ok(result)
}

/// Run a command in `dir`, feeding `input` on stdin. Fails if the command
/// exits non-zero.
///
/// # Errors
///
/// Returns an error if the program cannot be spawned, stdin cannot be
/// written, or the command exits non-zero.
pub fn run_with_input(dir: &Path, program: &str, args: &[String], input: &[u8]) -> Result<ExecResult> {
    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute: {program}"))?;

    let output = std::thread::scope(|s| -> Result<Output> {
        if let Some(mut stdin) = child.stdin.take() {
            s.spawn(move || {
                // A program that ignores stdin closes the pipe early; its exit
                // status decides success, not the write.
                let _ = stdin.write_all(input);
            });
        }
        child
            .wait_with_output()
            .with_context(|| format!("failed to wait for: {program}"))
    })?;

    check(ExecResult::from(output), program)
}

/// Check if a program is available on PATH.
#[must_use]
pub fn which(program: &str) -> bool {
    which::which(program).is_ok()
}
