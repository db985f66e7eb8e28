use super::{AnalysisOutcome, Analyzer, FailureReason};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// How long to keep reading the pipes once the analyzer has exited
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Analyzer backed by a child process with a hard wall-clock timeout.
///
/// On unix the child leads its own process group. Whatever it started is
/// killed with it, on timeout and after a normal exit alike.
#[derive(Debug, Clone)]
pub struct ProcessAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl Analyzer for ProcessAnalyzer {
    async fn invoke(&self, path: &Path) -> AnalysisOutcome {
        let started = Instant::now();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn analyzer {}: {}", self.program, e);
                return AnalysisOutcome::failure(
                    FailureReason::ProcessSpawnError,
                    format!("failed to spawn {}: {}", self.program, e),
                );
            }
        };

        // Armed until the group is killed explicitly; covers request cancellation
        let mut group = ProcessGroup::new(child.id());
        debug!("Spawned analyzer (pid={:?}) for {:?}", child.id(), path);

        // Pipes are read on their own tasks so a worker holding them open
        // cannot delay noticing the exit
        let mut stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_pipe(child.stderr.take()));

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status,
            Err(_) => {
                group.kill();
                // kill() also reaps the child
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out analyzer: {}", e);
                }
                stdout_task.abort();
                stderr_task.abort();
                warn!(
                    "Analyzer timed out after {:?} for {:?}",
                    self.timeout, path
                );
                return AnalysisOutcome::failure(
                    FailureReason::TimedOut,
                    format!("no exit within {:?}", self.timeout),
                );
            }
        };

        // Leftover workers would keep the pipes open
        group.kill();

        let drained = tokio::time::timeout(PIPE_DRAIN_GRACE, async {
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            (stdout, stderr)
        })
        .await;

        let (stdout, stderr) = match drained {
            Ok(captured) => captured,
            Err(_) => {
                warn!(
                    "Analyzer output still open {:?} after exit, discarding",
                    PIPE_DRAIN_GRACE
                );
                stdout_task.abort();
                stderr_task.abort();
                (Vec::new(), Vec::new())
            }
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to wait for analyzer: {}", e);
                return AnalysisOutcome::failure(
                    FailureReason::ProcessSpawnError,
                    format!("failed to wait for {}: {}", self.program, e),
                );
            }
        };

        info!(
            "Analyzer finished in {:.2}s ({}, stdout={} bytes, stderr={} bytes)",
            started.elapsed().as_secs_f64(),
            status,
            stdout.len(),
            stderr.len()
        );

        if !status.success() {
            return AnalysisOutcome::failure(
                FailureReason::NonZeroExit,
                format!("{}: {}", status, stderr.trim()),
            );
        }

        AnalysisOutcome::Success {
            raw_output: stdout,
            stderr,
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            warn!("Failed to read analyzer output: {}", e);
        }
    }
    buf
}

/// The analyzer's process group, killed once on `kill` or on drop
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    // pgid 0 would address our own group
    let pgid = match i32::try_from(pgid) {
        Ok(pgid) if pgid > 0 => pgid,
        _ => {
            warn!("Skipping kill for invalid process group {}", pgid);
            return;
        }
    };

    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => debug!("Killed analyzer process group {}", pgid),
        // Group already gone
        Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill analyzer process group {}: {}", pgid, e),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}
