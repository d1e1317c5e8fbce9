//! Acknowledgment-capture parsing.
//!
//! sbatch confirms a submission with `Submitted batch job <id>`. The
//! acknowledgment capture artifact carries that line first, so the id a
//! task currently answers to is always the trailing integer of the
//! capture's first line.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)\s*$").unwrap());

/// Extract the job id from an acknowledgment line (trailing-integer match).
pub fn parse_trailing_job_id(line: &str) -> Option<String> {
    TRAILING_ID.captures(line).map(|caps| caps[1].to_string())
}

/// Render the acknowledgment line sbatch would have printed for `job_id`.
///
/// Used to synthesize the capture artifact when a lost acknowledgment is
/// recovered through the accounting scan.
pub fn format_ack(job_id: &str) -> String {
    format!("Submitted batch job {job_id}")
}
