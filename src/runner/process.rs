//! Process runner implementation
//!
//! Executes a step as a direct child process. No sandboxing: the child runs
//! with the service's own privileges and environment.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::{CommandSpec, RunOutcome, RunStatus, Runner};
use crate::error::RunError;

/// Runner that spawns each step as a child process
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<RunOutcome, RunError> {
        if cmd.program.is_empty() {
            return Err(RunError::EmptyCommand);
        }

        debug!("Running {:?} in {:?}", cmd.to_vec(), cmd.work_dir);

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }

        // Own process group, so a timeout can take down anything the step forked
        #[cfg(unix)]
        {
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: cmd.program.clone(),
            source,
        })?;

        // The group outlives the leader, so remember its id before the leader is reaped
        let group_id = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Streams are drained concurrently with the wait so a chatty child
        // cannot block on a full pipe.
        let finished = tokio::time::timeout(timeout, async {
            let (status, stdout, stderr) =
                tokio::join!(child.wait(), read_stream(stdout), read_stream(stderr));
            Ok::<_, std::io::Error>((status?, stdout?, stderr?))
        })
        .await;

        match finished {
            Ok(Ok((status, stdout, stderr))) => Ok(RunOutcome {
                stdout,
                stderr,
                status: run_status(status),
            }),
            Ok(Err(source)) => {
                terminate(&mut child, group_id).await;
                Err(RunError::Wait {
                    program: cmd.program.clone(),
                    source,
                })
            }
            Err(_) => {
                warn!(
                    "`{}` exceeded {}ms, killing it",
                    cmd.program,
                    timeout.as_millis()
                );
                terminate(&mut child, group_id).await;
                Err(RunError::TimedOut {
                    program: cmd.program.clone(),
                    after: timeout,
                })
            }
        }
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn run_status(status: ExitStatus) -> RunStatus {
    if let Some(code) = status.code() {
        return RunStatus::Exited(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return RunStatus::Signaled(signal);
        }
    }

    RunStatus::Exited(-1)
}

/// Forcibly stop the child (and on Unix its whole process group), then reap it
async fn terminate(child: &mut Child, group_id: Option<u32>) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = group_id {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                debug!("killpg({}) failed: {}", pid, e);
            }
        }
    }

    #[cfg(not(unix))]
    let _ = group_id;

    if let Err(e) = child.kill().await {
        debug!("Failed to kill child process: {}", e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").with_args(["-c", script])
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let outcome = ProcessRunner::new()
            .run(&sh("echo out; echo err >&2"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_reports_exit_code() {
        let outcome = ProcessRunner::new()
            .run(&sh("exit 3"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Exited(3));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_runs_in_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = sh("pwd").with_work_dir(dir.path());
        let outcome = ProcessRunner::new()
            .run(&cmd, Duration::from_secs(5))
            .await
            .unwrap();

        let expected = dir.path().canonicalize().unwrap();
        let actual = std::path::Path::new(outcome.stdout.trim())
            .canonicalize()
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        let outcome = ProcessRunner::new()
            .run(&sh("cat; echo done"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.stdout, "done\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = ProcessRunner::new()
            .run(
                &CommandSpec::new("definitely-not-a-real-binary-1234"),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_empty_program_rejected() {
        let err = ProcessRunner::new()
            .run(&CommandSpec::new(""), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survived");
        // The background sleeper would create the marker if it outlived the kill
        let script = format!("(sleep 1; touch {}) & sleep 30", marker.display());

        let started = Instant::now();
        let err = ProcessRunner::new()
            .run(&sh(&script), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
