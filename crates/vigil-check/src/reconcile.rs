//! The reconciliation loop: query, reconcile identity, classify, act.

use camino::Utf8PathBuf;
use thiserror::Error;
use tokio::time::sleep;
use vigil_core::{
    classify_state, rebucket, ArtifactError, Backoff, ClassifyError, EventLog, StateCategory,
    WorkDir,
};
use vigil_parsers::{parse_resource_request, replace_resource_request, ResourceRequest, ScriptError};
use vigil_slurm::{query_job, SacctRecord, SlurmCommands};
use vigil_submit::{resubmit, ResubmitError};

#[derive(Error, Debug)]
pub enum CheckError {
    /// The accounting trace is gone: no working directory is known, so no
    /// recovery action is possible.
    #[error("no sacct information for job {job_id}")]
    RecordVanished { job_id: String },
    /// Every query attempt failed without resolving a state.
    #[error("accounting queries exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: usize, last_error: String },
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Resubmit(#[from] ResubmitError),
    #[error("event log: {0}")]
    Log(#[from] std::io::Error),
}

/// Reconciler configuration, built once at process start.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Maximum accounting queries before reporting failure.
    pub max_queries: usize,
    /// Deliberately large delays (minutes): accounting databases on busy
    /// clusters lag well behind the controller.
    pub backoff: Backoff,
    /// Multiplier applied to the runtime request after a timeout.
    pub time_factor: f64,
    pub user: String,
    pub commands: SlurmCommands,
    pub log_path: Utf8PathBuf,
}

impl CheckConfig {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            max_queries: 4,
            backoff: Backoff::new(150.0, 300.0),
            time_factor: 1.5,
            user: user.into(),
            commands: SlurmCommands::default(),
            log_path: "vigil.log".into(),
        }
    }
}

/// What the reconciler did.
///
/// Every variant reads as success to the caller: the job is alive, back
/// in the queue, or finished and ready for the engine's own return-code
/// inspection. Liveness and task-result are deliberately separate
/// concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Job is alive; nothing to do.
    Running { state: String },
    /// Job reached a final state; the engine interprets rc/stderr itself.
    Final { state: String },
    /// Job was resubmitted with unchanged parameters.
    Resubmitted { state: String, new_job_id: String },
    /// Runtime was extended and the job resubmitted.
    TimeoutResubmitted {
        new_runtime_minutes: u64,
        new_job_id: String,
    },
}

/// Determine the disposition of `job_id`, retrying the whole check cycle
/// when a single accounting sample cannot be trusted.
pub async fn check(cfg: &CheckConfig, job_id: &str) -> Result<Disposition, CheckError> {
    let log = EventLog::new(cfg.log_path.clone());
    let mut last_error = String::from("no query attempted");

    for attempt in 0..cfg.max_queries {
        if attempt > 0 {
            sleep(cfg.backoff.delay(attempt)).await;
        }

        let record = match query_job(&cfg.commands, &cfg.user, job_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                log.append(&format!("no sacct information for job {job_id}"))?;
                return Err(CheckError::RecordVanished {
                    job_id: job_id.to_string(),
                });
            }
            Err(e) => {
                last_error = e.to_string();
                continue;
            }
        };

        // Identity reconciliation: the acknowledgment capture knows which
        // id the task currently answers to; an out-of-band resubmission
        // re-keys the job without telling us.
        let believed = WorkDir::new(record.work_dir.clone()).read_acked_job_id()?;
        let (record, alias) = if believed != job_id {
            log.append(&format!("Called job ID was {job_id} and is now {believed}"))?;
            match query_job(&cfg.commands, &cfg.user, &believed).await {
                Ok(Some(current)) => {
                    (current, format!("in place of restarted job {job_id}"))
                }
                Ok(None) => {
                    log.append(&format!("no sacct information for job {believed}"))?;
                    return Err(CheckError::RecordVanished { job_id: believed });
                }
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            }
        } else {
            (record, String::new())
        };

        return dispatch(cfg, &log, record, alias).await;
    }

    log.append(&format!("sacct failed for job {job_id}: {last_error}"))?;
    Err(CheckError::Exhausted {
        attempts: cfg.max_queries,
        last_error,
    })
}

/// Classify the resolved state and perform the associated action.
async fn dispatch(
    cfg: &CheckConfig,
    log: &EventLog,
    record: SacctRecord,
    alias: String,
) -> Result<Disposition, CheckError> {
    let workdir = WorkDir::new(record.work_dir.clone());
    let category = classify_state(&record.state)?;

    match category {
        StateCategory::Running => {
            log.append(&outcome_line(&record, &alias))?;
            Ok(Disposition::Running {
                state: record.state,
            })
        }
        StateCategory::Final => {
            log.append(&outcome_line(&record, &alias))?;
            Ok(Disposition::Final {
                state: record.state,
            })
        }
        StateCategory::Resubmit => {
            let new_job_id = resubmit(&cfg.commands, &workdir).await?;
            log.append(&outcome_line(&record, &alias))?;
            Ok(Disposition::Resubmitted {
                state: record.state,
                new_job_id,
            })
        }
        StateCategory::Timeout => {
            let extended = extend_runtime(&workdir, cfg.time_factor)?;
            workdir.clear_return_code()?;
            let new_job_id = resubmit(&cfg.commands, &workdir).await?;
            let alias = alias.replace("restarted", "timed-out");
            log.append(&outcome_line(&record, &alias))?;
            Ok(Disposition::TimeoutResubmitted {
                new_runtime_minutes: extended.runtime_minutes,
                new_job_id,
            })
        }
    }
}

fn outcome_line(record: &SacctRecord, alias: &str) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        record.job_id, record.work_dir, record.state, alias
    )
}

/// Raise the script's runtime request by `factor`, rebucket its queue
/// class, and rewrite the script in place.
fn extend_runtime(workdir: &WorkDir, factor: f64) -> Result<ResourceRequest, CheckError> {
    let script = workdir.read_submit_script()?;
    let current = parse_resource_request(&script)?;

    let new_minutes = (current.runtime_minutes as f64 * factor).ceil() as u64;
    let extended = ResourceRequest {
        runtime_minutes: new_minutes,
        queue_class: rebucket(new_minutes, &current.queue_class),
    };

    let rewritten = replace_resource_request(&script, &extended)?;
    workdir.write_submit_script(&rewritten)?;
    Ok(extended)
}
