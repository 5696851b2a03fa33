// # Process Probe Runner
//
// This crate provides the `ProbeRunner` that executes the real `mtr`
// binary as a child process.
//
// ## Behavior
//
// - Runs the binary once with exactly the arguments it was given
// - Captures stdout and stderr concurrently (no pipe deadlock)
// - Exit status zero: stdout is returned as text (lossy UTF-8)
// - Non-zero exit: `Error::Process` with stderr verbatim
// - Cancel fires first: the child is killed and reaped, `Error::Canceled`
//
// ## Constraints
//
// - NO retries (a failed run is reported as-is)
// - NO output parsing (owned by `mtr_core::decode`)
// - The child is spawned with `kill_on_drop`, so dropping the run future
//   also terminates it

use async_trait::async_trait;
use mtr_core::traits::ProbeRunner;
use mtr_core::{Cancel, Error, Result};
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, warn};

/// Default probe binary, resolved through `PATH`
pub const DEFAULT_BINARY: &str = "mtr";

/// Runs the probe binary as a subprocess
#[derive(Debug, Clone)]
pub struct ProcessProbeRunner {
    /// Binary path or name
    binary: String,
}

enum Outcome {
    Exited(std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)>),
    Canceled(String),
}

impl ProcessProbeRunner {
    /// Create a runner for `binary`
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The configured binary
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for ProcessProbeRunner {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

#[async_trait]
impl ProbeRunner for ProcessProbeRunner {
    async fn run(&self, args: &[String], cancel: Cancel) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                debug!("Failed to spawn {}: {}", self.binary, e);
                Error::Io(e)
            })?;
        debug!("Spawned {} (pid {:?})", self.binary, child.id());

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(Error::Other("Probe output pipes unavailable".to_string()));
        };

        let outcome = tokio::select! {
            exited = collect(&mut child, stdout, stderr) => Outcome::Exited(exited),
            reason = cancel.fired() => Outcome::Canceled(reason),
        };

        match outcome {
            Outcome::Exited(exited) => {
                let (status, stdout, stderr) = exited?;
                if status.success() {
                    Ok(String::from_utf8_lossy(&stdout).into_owned())
                } else {
                    debug!("{} exited with {}", self.binary, status);
                    Err(Error::process(
                        status.to_string(),
                        String::from_utf8_lossy(&stderr),
                    ))
                }
            }
            Outcome::Canceled(reason) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill canceled probe: {}", e);
                }
                debug!("Probe canceled: {}", reason);
                Err(Error::canceled(reason))
            }
        }
    }

    fn runner_name(&self) -> &'static str {
        "process"
    }
}

/// Wait for exit while draining both pipes
async fn collect(
    child: &mut Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
) -> std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let (status, read_out, read_err) = tokio::join!(
        child.wait(),
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err)
    );
    read_out?;
    read_err?;
    Ok((status?, out, err))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio_test::{assert_err, assert_ok};

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn stdout_is_returned_on_success() {
        let runner = ProcessProbeRunner::new("/bin/sh");
        let out = assert_ok!(
            runner
                .run(&sh("printf 'h 0 10.0.0.1\\np 0 1200\\n'"), Cancel::never())
                .await
        );
        assert_eq!(out, "h 0 10.0.0.1\np 0 1200\n");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let runner = ProcessProbeRunner::new("/bin/sh");
        let err = assert_err!(
            runner
                .run(&sh("echo 'mtr: unknown host' >&2; exit 3"), Cancel::never())
                .await
        );
        match err {
            Error::Process { status, stderr } => {
                assert!(status.contains('3'), "status was {status}");
                assert_eq!(stderr, "mtr: unknown host\n");
            }
            other => panic!("expected Process, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_kills_child() {
        let runner = ProcessProbeRunner::new("/bin/sh");
        let started = Instant::now();
        let err = assert_err!(
            runner
                .run(&sh("sleep 30"), Cancel::after(Duration::from_millis(100)))
                .await
        );
        assert!(matches!(err, Error::Canceled(ref r) if r.contains("deadline")));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_binary_is_io_error() {
        let runner = ProcessProbeRunner::new("/nonexistent/mtr");
        let err = assert_err!(runner.run(&[], Cancel::never()).await);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn default_binary_is_mtr() {
        assert_eq!(ProcessProbeRunner::default().binary(), "mtr");
    }
}
