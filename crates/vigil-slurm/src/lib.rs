//! SLURM integration for vigil.
//!
//! Accounting queries via sacct and submission-request construction for
//! sbatch. Program names are injectable so tests can substitute fixture
//! executables for the real scheduler surfaces.

pub mod sacct;
pub mod sbatch;
pub mod types;

pub use sacct::{query_job, scan_user_jobs, SacctError};
pub use sbatch::{is_lost_ack, sbatch_args, LOST_ACK_SIGNATURE};
pub use types::{MemorySpec, SacctRecord, SbatchRequest, SlurmCommands};
