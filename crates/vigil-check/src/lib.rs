//! The liveness reconciler.
//!
//! Given a previously submitted job id, poll SLURM accounting, classify
//! the reported state, reconcile identity drift, and keep the job present
//! in the scheduler until a final state is reached.

pub mod reconcile;

pub use reconcile::{check, CheckConfig, CheckError, Disposition};
