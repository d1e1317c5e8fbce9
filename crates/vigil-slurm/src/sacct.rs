//! Query SLURM accounting state via sacct.

use crate::types::{SacctRecord, SlurmCommands};
use camino::Utf8Path;
use thiserror::Error;
use tokio::process::Command;
use vigil_parsers::{run_captured, CommandError};

#[derive(Error, Debug)]
pub enum SacctError {
    #[error(transparent)]
    Execution(#[from] CommandError),
    #[error("sacct exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("unparsable sacct record: {0}")]
    Parse(String),
}

/// Record format requested from sacct (`-P` pipe-delimited, `-X` top-level
/// step only, `-n` no header).
const SACCT_FORMAT: &str = "JobID,WorkDir,State";

fn parse_record(line: &str) -> Result<SacctRecord, SacctError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 3 {
        return Err(SacctError::Parse(format!(
            "expected 3 fields, got {}: {line}",
            fields.len()
        )));
    }
    Ok(SacctRecord {
        job_id: fields[0].trim().to_string(),
        work_dir: fields[1].trim().into(),
        state: fields[2].trim().to_string(),
    })
}

fn base_command(sacct: &Utf8Path, user: &str) -> Command {
    let mut cmd = Command::new(sacct.as_std_path());
    cmd.args(["-u", user, "--format", SACCT_FORMAT, "-P", "-X", "-n"]);
    cmd
}

/// Most recent accounting record for one job id.
///
/// `Ok(None)` means sacct ran but has no record for this id. A record
/// whose JobID differs from the one requested is treated the same way
/// rather than silently trusted.
pub async fn query_job(
    commands: &SlurmCommands,
    user: &str,
    job_id: &str,
) -> Result<Option<SacctRecord>, SacctError> {
    let mut cmd = base_command(&commands.sacct, user);
    cmd.args(["-j", job_id]);

    let out = run_captured(&mut cmd, "sacct").await?;
    if !out.success() {
        return Err(SacctError::Failed {
            code: out.code,
            stderr: out.stderr,
        });
    }

    let line = match out.stdout.lines().find(|l| !l.trim().is_empty()) {
        Some(line) => line,
        None => return Ok(None),
    };

    let record = parse_record(line)?;
    if record.job_id != job_id {
        tracing::warn!(
            "sacct returned a record for job {} when asked about {}",
            record.job_id,
            job_id
        );
        return Ok(None);
    }
    Ok(Some(record))
}

/// Every accounting record for `user`, for working-directory scans.
pub async fn scan_user_jobs(
    commands: &SlurmCommands,
    user: &str,
) -> Result<Vec<SacctRecord>, SacctError> {
    let mut cmd = base_command(&commands.sacct, user);

    let out = run_captured(&mut cmd, "sacct").await?;
    if !out.success() {
        return Err(SacctError::Failed {
            code: out.code,
            stderr: out.stderr,
        });
    }

    let mut records = Vec::new();
    for line in out.stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(line) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("skipping sacct line: {e}"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let record = parse_record("4242|/data/jobs/align/work|RUNNING").unwrap();
        assert_eq!(record.job_id, "4242");
        assert_eq!(record.work_dir, Utf8Path::new("/data/jobs/align/work"));
        assert_eq!(record.state, "RUNNING");
    }

    #[test]
    fn test_parse_record_keeps_state_suffix() {
        let record = parse_record("7|/w|CANCELLED by 1001").unwrap();
        assert_eq!(record.state, "CANCELLED by 1001");
    }

    #[test]
    fn test_parse_record_too_few_fields() {
        assert!(matches!(
            parse_record("4242|/data/jobs"),
            Err(SacctError::Parse(_))
        ));
    }
}
