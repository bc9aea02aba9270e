// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Execution of AppleScript against Calendar.
//!
//! [`ScriptRunner`] is the seam between the engine and the host; the
//! production implementation spawns `osascript -e <script>` directly (no
//! shell in between) and returns its trimmed stdout.

use super::{CalendarError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs one script and returns the host's textual reply.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &str) -> Result<String>;
}

/// `osascript` with a hard timeout per invocation.
#[derive(Debug, Clone)]
pub struct OsascriptRunner {
    program: PathBuf,
    timeout: Duration,
}

impl OsascriptRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

impl Default for OsascriptRunner {
    fn default() -> Self {
        Self::new("osascript", Duration::from_secs(30))
    }
}

#[async_trait]
impl ScriptRunner for OsascriptRunner {
    async fn run(&self, script: &str) -> Result<String> {
        let child = Command::new(&self.program)
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CalendarError::Execution(format!("{} not found", self.program.display()))
                } else {
                    CalendarError::Execution(format!(
                        "failed to start {}: {e}",
                        self.program.display()
                    ))
                }
            })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                CalendarError::Execution(format!("failed to read osascript output: {e}"))
            })?,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "osascript timed out"
                );
                return Err(CalendarError::Execution(format!(
                    "osascript timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(status = %output.status, stderr = %stderr, "osascript failed");
            return Err(CalendarError::Execution(if stderr.is_empty() {
                format!("osascript exited with {}", output.status)
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_osascript(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    // One test so no other spawn in this binary races the script writes.
    #[tokio::test]
    async fn reports_output_failures_and_timeouts() {
        let dir = tempfile::tempdir().unwrap();

        let echo = fake_osascript(dir.path(), "echo.sh", r#"printf '  %s\n\n' "$2""#);
        let runner = OsascriptRunner::new(&echo, Duration::from_secs(10));
        let out = runner.run("return 42").await.unwrap();
        assert_eq!(out, "return 42");

        let failing = fake_osascript(
            dir.path(),
            "fail.sh",
            "echo \"execution error: Can't get calendar \\\"Nope\\\". (-1728)\" >&2\nexit 1",
        );
        let runner = OsascriptRunner::new(&failing, Duration::from_secs(10));
        let err = runner.run("anything").await.unwrap_err();
        assert_eq!(
            err,
            CalendarError::Execution(
                "execution error: Can't get calendar \"Nope\". (-1728)".into()
            )
        );

        let silent = fake_osascript(dir.path(), "silent.sh", "exit 3");
        let runner = OsascriptRunner::new(&silent, Duration::from_secs(10));
        let err = runner.run("anything").await.unwrap_err();
        assert!(err.to_string().contains("exited with"));

        let slow = fake_osascript(dir.path(), "slow.sh", "sleep 5");
        let runner = OsascriptRunner::new(&slow, Duration::from_millis(200));
        let err = runner.run("anything").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));

        let runner = OsascriptRunner::new(dir.path().join("missing"), Duration::from_secs(1));
        let err = runner.run("anything").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
