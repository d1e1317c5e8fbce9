//! Core types for vigil.
//!
//! Scheduler-state classification, queue-class bucketing, randomized
//! retry backoff, the durable event log, and the working-directory
//! artifact layout shared by the submission driver and the liveness
//! reconciler.

pub mod backoff;
pub mod classify;
pub mod events;
pub mod queue;
pub mod workdir;

pub use backoff::Backoff;
pub use classify::{classify_state, ClassifyError, StateCategory};
pub use events::EventLog;
pub use queue::{bucket_runtime, queue_class, rebucket};
pub use workdir::{ArtifactError, WorkDir};
