//! External process execution

use crate::error::{AarsyncError, AarsyncResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Max number of output lines kept in tool failure messages
const ERROR_TAIL_LINES: usize = 50;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Tail of stdout followed by stderr, for error diagnostics
    pub fn tail(&self) -> String {
        let lines: Vec<&str> = self.stdout.lines().chain(self.stderr.lines()).collect();
        let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
        lines[start..].join("\n")
    }
}

/// Runs a program to completion and captures its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> AarsyncResult<CommandOutput>;
}

/// [`CommandRunner`] spawning real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> AarsyncResult<CommandOutput> {
        debug!("Running {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => AarsyncError::BuildToolNotFound {
                    command: program.to_string(),
                },
                _ => AarsyncError::command_failed(program, e),
            })?;

        let (stdout, stderr) = stream_child_output(&mut child).await?;
        let status = child
            .wait()
            .await
            .map_err(|e| AarsyncError::command_failed(program, e))?;

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Drain stdout and stderr concurrently, logging every line.
async fn stream_child_output(child: &mut tokio::process::Child) -> AarsyncResult<(String, String)> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AarsyncError::Internal("stdout not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AarsyncError::Internal("stderr not piped".to_string()))?;

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();

    let mut out = String::new();
    let mut err = String::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        debug!(target: "aarsync::tool", "{}", line);
                        out.push_str(&line);
                        out.push('\n');
                    }
                    _ => stdout_done = true,
                }
            }
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        debug!(target: "aarsync::tool", "{}", line);
                        err.push_str(&line);
                        err.push('\n');
                    }
                    _ => stderr_done = true,
                }
            }
        }
    }

    Ok((out, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let stdout: String = (0..60).map(|i| format!("line {}\n", i)).collect();
        let output = CommandOutput {
            exit_code: Some(1),
            stdout,
            stderr: "boom\n".into(),
        };
        let tail = output.tail();
        assert_eq!(tail.lines().count(), ERROR_TAIL_LINES);
        assert!(tail.ends_with("boom"));
        assert!(!tail.contains("line 10\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_and_status() {
        let dir = std::env::temp_dir();
        let output = ProcessRunner
            .run(
                "sh",
                &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
                &dir,
            )
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let dir = std::env::temp_dir();
        let err = ProcessRunner
            .run("aarsync-no-such-tool", &[], &dir)
            .await
            .unwrap_err();
        assert!(matches!(err, AarsyncError::BuildToolNotFound { .. }));
    }
}
