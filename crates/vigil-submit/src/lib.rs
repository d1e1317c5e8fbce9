//! The submission driver.
//!
//! Submits one task to SLURM with a fully specified resource request,
//! retrying transient submission failures and recovering the case where
//! the acknowledgment was lost but the job actually exists.

pub mod driver;
pub mod resubmit;

pub use driver::{submit_with_retry, SubmitConfig, SubmitError, SubmitOutcome};
pub use resubmit::{resubmit, ResubmitError};
