//! Running external programs.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use bookrelease_shared::{BookReleaseError, Result};

/// Captured output of a finished program.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Find `program` on `PATH`.
pub fn locate(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| BookReleaseError::ToolNotFound {
        program: program.to_string(),
    })
}

/// Run `program` to completion and capture its output, whatever the status.
///
/// Fails only if the program could not be started.
pub async fn capture<I, S>(program: &str, args: I) -> Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args
        .into_iter()
        .map(|a| a.as_ref().to_os_string())
        .collect();
    debug!(program, ?args, "running external tool");

    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BookReleaseError::ToolNotFound {
                program: program.to_string(),
            },
            _ => BookReleaseError::io(program, e),
        })?;

    Ok(ProcessOutput {
        // No code means the process was killed by a signal.
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run `program` and fail with [`BookReleaseError::ToolFailed`] on a non-zero exit.
pub async fn run<I, S>(program: &str, args: I) -> Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = capture(program, args).await?;
    if !output.success() {
        return Err(BookReleaseError::ToolFailed {
            tool: program.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_tool_not_found() {
        let err = run("bookrelease-no-such-program", ["--version"])
            .await
            .unwrap_err();
        assert!(matches!(err, BookReleaseError::ToolNotFound { .. }));
    }

    #[test]
    fn locate_missing_program() {
        let err = locate("bookrelease-no-such-program").unwrap_err();
        assert!(err.to_string().contains("bookrelease-no-such-program"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_status_and_stderr() {
        let err = run("sh", ["-c", "echo nope >&2; exit 3"]).await.unwrap_err();
        match err {
            BookReleaseError::ToolFailed { tool, status, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(status, 3);
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn capture_keeps_failed_output() {
        let out = capture("sh", ["-c", "echo out; exit 1"]).await.unwrap();
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "out");
    }
}
