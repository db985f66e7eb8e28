// Integration tests for the process-backed analyzer
//
// These tests run small shell scripts as the analyzer to exercise exit
// codes, stderr handling, spawn failures and the wall-clock timeout.
#![cfg(unix)]

use anyhow::Result;
use neurovoice::{AnalysisOutcome, Analyzer, FailureReason, ProcessAnalyzer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write_script(dir: &Path, body: &str) -> Result<PathBuf> {
    let path = dir.join("analyzer.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    Ok(path)
}

fn sh_analyzer(script: &Path, timeout: Duration) -> ProcessAnalyzer {
    ProcessAnalyzer::new(
        "/bin/sh",
        vec![script.to_string_lossy().into_owned()],
        timeout,
    )
}

fn audio_file(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("sample.audio");
    fs::write(&path, b"RIFF")?;
    Ok(path)
}

fn read_pid(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

// A killed process that nobody has reaped yet shows up as a zombie; treat
// that as gone.
fn is_running(pid: &str) -> bool {
    let stat = Path::new("/proc").join(pid).join("stat");
    if Path::new("/proc/self/stat").exists() {
        return match fs::read_to_string(&stat) {
            Ok(stat) => stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.trim_start().chars().next())
                .map_or(false, |state| state != 'Z'),
            Err(_) => false,
        };
    }

    std::process::Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

async fn wait_until_gone(pid: &str) -> bool {
    for _ in 0..40 {
        if !is_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_success_captures_stdout() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let script = write_script(
        temp_dir.path(),
        r#"echo "{\"tremor_probability\": 0.2, \"file\": \"$1\"}""#,
    )?;
    let audio = audio_file(temp_dir.path())?;

    let outcome = sh_analyzer(&script, Duration::from_secs(10)).invoke(&audio).await;

    match outcome {
        AnalysisOutcome::Success { raw_output, stderr } => {
            assert!(raw_output.contains("0.2"));
            assert!(
                raw_output.contains(&*audio.to_string_lossy()),
                "Audio path should be the last argument"
            );
            assert!(stderr.is_empty());
        }
        other => panic!("Expected success, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_stderr_is_not_fatal() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let script = write_script(
        temp_dir.path(),
        "echo 'UserWarning: old sklearn' >&2\necho '{}'",
    )?;
    let audio = audio_file(temp_dir.path())?;

    let outcome = sh_analyzer(&script, Duration::from_secs(10)).invoke(&audio).await;

    match outcome {
        AnalysisOutcome::Success { raw_output, stderr } => {
            assert_eq!(raw_output.trim(), "{}");
            assert!(stderr.contains("UserWarning"));
        }
        other => panic!("Expected success, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_non_zero_exit_is_failure_even_with_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let script = write_script(
        temp_dir.path(),
        r#"echo '{"tremor_probability": 0.5, "severity": "Medium", "tremor_detected": true, "frequency_hz": 4.0}'
echo 'model file missing' >&2
exit 3"#,
    )?;
    let audio = audio_file(temp_dir.path())?;

    let outcome = sh_analyzer(&script, Duration::from_secs(10)).invoke(&audio).await;

    match outcome {
        AnalysisOutcome::Failure { reason, diagnostic } => {
            assert_eq!(reason, FailureReason::NonZeroExit);
            assert!(diagnostic.contains("model file missing"));
        }
        other => panic!("Expected failure, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_missing_binary_is_spawn_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let audio = audio_file(temp_dir.path())?;
    let analyzer = ProcessAnalyzer::new(
        "/nonexistent/analyzer",
        Vec::new(),
        Duration::from_secs(10),
    );

    let outcome = analyzer.invoke(&audio).await;

    assert!(matches!(
        outcome,
        AnalysisOutcome::Failure {
            reason: FailureReason::ProcessSpawnError,
            ..
        }
    ));

    Ok(())
}

#[tokio::test]
async fn test_timeout_kills_child() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let pid_file = temp_dir.path().join("analyzer.pid");
    let script = write_script(
        temp_dir.path(),
        &format!("echo $$ > '{}'\nexec sleep 30", pid_file.display()),
    )?;
    let audio = audio_file(temp_dir.path())?;
    let timeout = Duration::from_secs(1);

    let started = Instant::now();
    let outcome = sh_analyzer(&script, timeout).invoke(&audio).await;
    let elapsed = started.elapsed();

    assert!(matches!(
        outcome,
        AnalysisOutcome::Failure {
            reason: FailureReason::TimedOut,
            ..
        }
    ));
    assert!(elapsed >= timeout, "Returned before the timeout: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "Took too long: {:?}", elapsed);

    let pid = read_pid(&pid_file)?;
    assert!(
        wait_until_gone(&pid).await,
        "Analyzer process {} still running",
        pid
    );

    Ok(())
}

#[tokio::test]
async fn test_timeout_kills_background_workers() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let pid_file = temp_dir.path().join("worker.pid");
    let script = write_script(
        temp_dir.path(),
        &format!("sleep 30 &\necho $! > '{}'\nwait", pid_file.display()),
    )?;
    let audio = audio_file(temp_dir.path())?;
    let timeout = Duration::from_secs(1);

    let started = Instant::now();
    let outcome = sh_analyzer(&script, timeout).invoke(&audio).await;
    let elapsed = started.elapsed();

    assert!(matches!(
        outcome,
        AnalysisOutcome::Failure {
            reason: FailureReason::TimedOut,
            ..
        }
    ));
    assert!(elapsed < Duration::from_secs(5), "Took too long: {:?}", elapsed);

    let pid = read_pid(&pid_file)?;
    assert!(
        wait_until_gone(&pid).await,
        "Worker {} outlived the analyzer",
        pid
    );

    Ok(())
}

#[tokio::test]
async fn test_exit_is_not_masked_by_worker_holding_stdout() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let pid_file = temp_dir.path().join("worker.pid");
    let script = write_script(
        temp_dir.path(),
        &format!(
            r#"sleep 30 &
echo $! > '{}'
echo '{{"tremor_probability": 0.1, "severity": "Low", "tremor_detected": false, "frequency_hz": 0.0}}'
exit 0"#,
            pid_file.display()
        ),
    )?;
    let audio = audio_file(temp_dir.path())?;

    let started = Instant::now();
    let outcome = sh_analyzer(&script, Duration::from_secs(10)).invoke(&audio).await;
    let elapsed = started.elapsed();

    match outcome {
        AnalysisOutcome::Success { raw_output, .. } => {
            assert!(raw_output.contains("\"severity\": \"Low\""));
        }
        other => panic!("Expected success, got {:?}", other),
    }
    assert!(
        elapsed < Duration::from_secs(3),
        "Waited on the worker instead of the analyzer: {:?}",
        elapsed
    );

    let pid = read_pid(&pid_file)?;
    assert!(
        wait_until_gone(&pid).await,
        "Worker {} outlived the analyzer",
        pid
    );

    Ok(())
}
