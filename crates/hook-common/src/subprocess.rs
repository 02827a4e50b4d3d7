//! Subprocess execution utilities.

use anyhow::{Context, Result, bail};
use std::process::Output;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal)
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
}

impl CommandResult {
    /// Create from std::process::Output.
    pub fn from_output(output: &Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }
}

fn shell(cmd: &str) -> duct::Expression {
    if cfg!(target_os = "windows") {
        duct::cmd("cmd", ["/C", cmd])
    } else {
        duct::cmd("sh", ["-c", cmd])
    }
}

/// Run a shell command with `input` on stdin, killing it after `timeout`.
pub fn run_with_input(cmd: &str, input: &[u8], timeout: Duration) -> Result<CommandResult> {
    let handle = shell(cmd)
        .stdin_bytes(input.to_vec())
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .start()
        .with_context(|| format!("Failed to spawn command: {}", cmd))?;

    let start = Instant::now();
    loop {
        match handle.try_wait() {
            Ok(Some(output)) => return Ok(CommandResult::from_output(output)),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = handle.kill();
                    bail!("Command timed out after {:?}: {}", timeout, cmd);
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => return Err(e).context("Failed to wait for command"),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_input_pipes_stdin() {
        let result = run_with_input("cat", b"hello", Duration::from_secs(5)).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout, "hello");
    }

    #[test]
    fn test_run_with_input_reports_failure() {
        let result = run_with_input("exit 3", b"", Duration::from_secs(5)).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn test_run_with_input_times_out() {
        let err = run_with_input("sleep 5", b"", Duration::from_millis(100)).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
