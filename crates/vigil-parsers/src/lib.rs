//! Shared parsing utilities for scheduler calls and durable artifacts.
//!
//! This crate provides the pieces used by more than one component:
//! captured process execution, the submission-script resource-request
//! encoding, and acknowledgment (job id) extraction.

pub mod ack;
pub mod command;
pub mod script;

pub use ack::{format_ack, parse_trailing_job_id};
pub use command::{run_captured, CapturedOutput, CommandError};
pub use script::{
    parse_resource_request, replace_resource_request, ResourceRequest, ScriptError,
};
