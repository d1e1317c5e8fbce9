//! Scheduler-state classification.
//!
//! Every state sacct can report for a watched job maps to exactly one
//! category. A state outside the table is a contract error and must fail
//! loudly: a new scheduler state needs explicit handling, not a guess.

use thiserror::Error;

/// States where the job is alive and nothing needs doing.
const STATE_RUNNING: &[&str] = &[
    "PENDING",
    "RUNNING",
    "REQUEUED",
    "RESIZING",
    "REVOKED",
    "SUSPENDED",
];

/// States where the job is resubmitted with unchanged parameters.
const STATE_RESUBMIT: &[&str] = &["BOOT_FAIL", "DEADLINE", "NODE_FAIL", "PREEMPTED"];

/// States considered final; the workflow engine inspects rc/stderr itself.
const STATE_FINAL: &[&str] = &["CANCELLED", "COMPLETED", "FAILED", "OUT_OF_MEMORY"];

/// States where the runtime request is raised before resubmission.
const STATE_TIMEOUT: &[&str] = &["TIMEOUT"];

#[derive(Error, Debug)]
#[error("unrecognized scheduler state: {0}")]
pub struct ClassifyError(pub String);

/// The action a reported state calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCategory {
    Running,
    Resubmit,
    Final,
    Timeout,
}

/// Classify a raw sacct state string.
///
/// sacct may suffix states (`CANCELLED by 12345`); only the first
/// whitespace-delimited token is significant.
pub fn classify_state(raw: &str) -> Result<StateCategory, ClassifyError> {
    let base = raw.split_whitespace().next().unwrap_or(raw);

    if STATE_RUNNING.contains(&base) {
        Ok(StateCategory::Running)
    } else if STATE_RESUBMIT.contains(&base) {
        Ok(StateCategory::Resubmit)
    } else if STATE_FINAL.contains(&base) {
        Ok(StateCategory::Final)
    } else if STATE_TIMEOUT.contains(&base) {
        Ok(StateCategory::Timeout)
    } else {
        Err(ClassifyError(raw.to_string()))
    }
}
