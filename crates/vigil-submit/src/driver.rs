//! Submission with bounded retry and lost-acknowledgment recovery.

use camino::Utf8PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::sleep;
use vigil_core::{ArtifactError, Backoff, EventLog, WorkDir};
use vigil_parsers::{format_ack, parse_trailing_job_id, run_captured};
use vigil_slurm::{is_lost_ack, sbatch_args, scan_user_jobs, SacctError, SbatchRequest, SlurmCommands};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("sbatch succeeded but printed no parseable job id: {stdout:?}")]
    MalformedAck { stdout: String },
    #[error("submission failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: usize, last_error: String },
    #[error(transparent)]
    Sacct(#[from] SacctError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("event log: {0}")]
    Log(#[from] std::io::Error),
}

/// Submission driver configuration, built once at process start.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Maximum submission attempts before giving up.
    pub max_attempts: usize,
    pub backoff: Backoff,
    /// Requesting user, for the recovery accounting scan.
    pub user: String,
    pub commands: SlurmCommands,
    pub log_path: Utf8PathBuf,
}

impl SubmitConfig {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::new(60.0, 120.0),
            user: user.into(),
            commands: SlurmCommands::default(),
            log_path: "vigil.log".into(),
        }
    }
}

/// A successful submission: the id to watch and the acknowledgment line
/// the caller's capture should carry.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub job_id: String,
    pub ack: String,
    /// True when the id came from the accounting scan after a lost
    /// acknowledgment rather than from sbatch's own output.
    pub recovered: bool,
}

/// Submit a request, retrying transient failures with randomized backoff.
///
/// A failure carrying the lost-acknowledgment signature is checked against
/// accounting before any retry: if a job already holds this working
/// directory, the original submission went through and resubmitting would
/// duplicate it.
pub async fn submit_with_retry(
    cfg: &SubmitConfig,
    req: &SbatchRequest,
) -> Result<SubmitOutcome, SubmitError> {
    let log = EventLog::new(cfg.log_path.clone());
    let args = sbatch_args(req);
    let mut last_error = String::from("no attempt made");

    for attempt in 0..cfg.max_attempts {
        if attempt > 0 {
            sleep(cfg.backoff.delay(attempt)).await;
        }

        let mut cmd = Command::new(cfg.commands.sbatch.as_std_path());
        cmd.args(&args);
        let out = match run_captured(&mut cmd, "sbatch").await {
            Ok(out) => out,
            Err(e) => {
                last_error = e.to_string();
                continue;
            }
        };

        if out.success() {
            let ack = out.first_line().unwrap_or_default().to_string();
            let job_id = parse_trailing_job_id(&ack).ok_or(SubmitError::MalformedAck {
                stdout: out.stdout.clone(),
            })?;
            log.append(&format!("submitted batch job {job_id} ({})", req.job_name))?;
            return Ok(SubmitOutcome {
                job_id,
                ack,
                recovered: false,
            });
        }

        if is_lost_ack(&out.stderr) {
            match recover_lost_ack(cfg, req, &out.stderr).await {
                Ok(Some(outcome)) => {
                    log.append(&format!(
                        "job {} found via sacct after lost acknowledgment ({})",
                        outcome.job_id, req.job_name
                    ))?;
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("recovery scan failed: {e}"),
            }
        }

        last_error = if out.stderr.trim().is_empty() {
            format!("sbatch exited with {:?}", out.code)
        } else {
            out.stderr.trim_end().to_string()
        };
    }

    log.append(&format!(
        "submission of {} failed after {} attempts: {last_error}",
        req.job_name, cfg.max_attempts
    ))?;
    Err(SubmitError::Exhausted {
        attempts: cfg.max_attempts,
        last_error,
    })
}

/// Look for a job whose recorded working directory is ours. Finding one
/// means the submission succeeded despite the error, so the expected
/// acknowledgment is synthesized into the capture artifact and the scan is
/// noted alongside it.
async fn recover_lost_ack(
    cfg: &SubmitConfig,
    req: &SbatchRequest,
    sbatch_stderr: &str,
) -> Result<Option<SubmitOutcome>, SubmitError> {
    let records = scan_user_jobs(&cfg.commands, &cfg.user).await?;
    let Some(record) = records.iter().find(|r| r.work_dir == req.working_directory) else {
        return Ok(None);
    };

    let ack = format_ack(&record.job_id);
    let workdir = WorkDir::new(req.working_directory.clone());
    workdir.write_ack(&ack)?;
    workdir.write_recovery_note(&format!(
        "{}\nJob {} found via sacct",
        sbatch_stderr.trim_end(),
        record.job_id
    ))?;

    Ok(Some(SubmitOutcome {
        job_id: record.job_id.clone(),
        ack,
        recovered: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::{Utf8Path, Utf8PathBuf};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;
    use vigil_slurm::{MemorySpec, LOST_ACK_SIGNATURE};

    fn fake_command(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn temp_root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap()
    }

    fn config(root: &Utf8Path, max_attempts: usize) -> SubmitConfig {
        SubmitConfig {
            max_attempts,
            backoff: Backoff::new(0.0, 0.001),
            user: "testuser".to_string(),
            commands: SlurmCommands::default(),
            log_path: root.join("vigil.log"),
        }
    }

    fn request(root: &Utf8Path) -> SbatchRequest {
        let workdir = root.join("task");
        SbatchRequest {
            job_name: "align_sample".to_string(),
            working_directory: workdir.clone(),
            stdout_path: workdir.join("execution/stdout"),
            stderr_path: workdir.join("execution/stderr"),
            runtime_minutes: 1000,
            queue_class: None,
            cpus: 1,
            memory: MemorySpec::Total(4096),
            constraint: None,
            qos: None,
            account: None,
            script: workdir.join("execution/script"),
        }
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let mut cfg = config(&root, 3);
        cfg.commands.sbatch = fake_command(&root, "sbatch", r#"echo "Submitted batch job 4242""#);

        let outcome = submit_with_retry(&cfg, &request(&root)).await.unwrap();
        assert_eq!(outcome.job_id, "4242");
        assert_eq!(outcome.ack, "Submitted batch job 4242");
        assert!(!outcome.recovered);
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let mut cfg = config(&root, 3);
        // Fails on the first call, succeeds on the second.
        cfg.commands.sbatch = fake_command(
            &root,
            "sbatch",
            &format!(
                r#"if [ -f {root}/called ]; then echo "Submitted batch job 7"; else touch {root}/called; echo "slurm unavailable" >&2; exit 1; fi"#
            ),
        );

        let outcome = submit_with_retry(&cfg, &request(&root)).await.unwrap();
        assert_eq!(outcome.job_id, "7");
    }

    #[tokio::test]
    async fn test_exhaustion_propagates_last_stderr() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let mut cfg = config(&root, 3);
        cfg.commands.sbatch = fake_command(
            &root,
            "sbatch",
            &format!(r#"echo x >> {root}/calls; echo "sbatch: error: queue closed" >&2; exit 1"#),
        );

        let err = submit_with_retry(&cfg, &request(&root)).await.unwrap_err();
        match err {
            SubmitError::Exhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("queue closed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let calls = fs::read_to_string(root.join("calls")).unwrap();
        assert_eq!(calls.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_lost_ack_recovered_via_accounting_scan() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let mut cfg = config(&root, 3);
        let req = request(&root);

        cfg.commands.sbatch = fake_command(
            &root,
            "sbatch",
            &format!(
                r#"echo x >> {root}/sbatch_calls; echo "sbatch: error: {LOST_ACK_SIGNATURE}" >&2; exit 1"#
            ),
        );
        cfg.commands.sacct = fake_command(
            &root,
            "sacct",
            &format!(r#"echo "123456|{}|RUNNING""#, req.working_directory),
        );

        let outcome = submit_with_retry(&cfg, &req).await.unwrap();
        assert_eq!(outcome.job_id, "123456");
        assert!(outcome.recovered);

        // No duplicate submission: sbatch ran exactly once.
        let calls = fs::read_to_string(root.join("sbatch_calls")).unwrap();
        assert_eq!(calls.lines().count(), 1);

        // The synthesized acknowledgment is durable and well-formed.
        let workdir = WorkDir::new(req.working_directory.clone());
        assert_eq!(workdir.read_acked_job_id().unwrap(), "123456");
        let note = fs::read_to_string(workdir.recovery_note()).unwrap();
        assert!(note.contains("Job 123456 found via sacct"));
    }

    #[tokio::test]
    async fn test_lost_ack_without_matching_workdir_keeps_retrying() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let mut cfg = config(&root, 2);

        cfg.commands.sbatch = fake_command(
            &root,
            "sbatch",
            &format!(r#"echo "sbatch: error: {LOST_ACK_SIGNATURE}" >&2; exit 1"#),
        );
        // Accounting knows about someone else's job only.
        cfg.commands.sacct =
            fake_command(&root, "sacct", r#"echo "999|/somewhere/else|RUNNING""#);

        let err = submit_with_retry(&cfg, &request(&root)).await.unwrap_err();
        assert!(matches!(err, SubmitError::Exhausted { attempts: 2, .. }));
    }
}
