//! Re-execute a task's submission script.
//!
//! The submission script in the working directory contains the full
//! driver invocation, so running it again replays the whole submission
//! path, retries included. This layer executes the script, refreshes the
//! acknowledgment capture with its output, and reports the new job id.

use camino::Utf8PathBuf;
use thiserror::Error;
use tokio::process::Command;
use vigil_core::{ArtifactError, WorkDir};
use vigil_parsers::{parse_trailing_job_id, run_captured, CommandError};
use vigil_slurm::SlurmCommands;

#[derive(Error, Debug)]
pub enum ResubmitError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("resubmission via {script} exited with {code:?}: {stderr}")]
    Failed {
        script: Utf8PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("resubmission printed no parseable job id: {stdout:?}")]
    MalformedAck { stdout: String },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Run the working directory's submission script again.
///
/// Stdout of the script becomes the new acknowledgment capture, so the
/// task afterwards answers to the id this call returns.
pub async fn resubmit(
    commands: &SlurmCommands,
    workdir: &WorkDir,
) -> Result<String, ResubmitError> {
    let script = workdir.submit_script();

    let mut cmd = Command::new(commands.shell.as_std_path());
    cmd.arg(script.as_str());
    let out = run_captured(&mut cmd, "resubmit").await?;

    if !out.success() {
        return Err(ResubmitError::Failed {
            script,
            code: out.code,
            stderr: out.stderr,
        });
    }

    let ack = out.first_line().unwrap_or_default();
    let job_id = parse_trailing_job_id(ack).ok_or(ResubmitError::MalformedAck {
        stdout: out.stdout.clone(),
    })?;
    workdir.write_ack(out.stdout.trim_end())?;
    Ok(job_id)
}
