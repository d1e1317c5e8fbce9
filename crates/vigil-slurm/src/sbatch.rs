//! sbatch request construction and submission-failure signatures.

use crate::types::{MemorySpec, SbatchRequest};
use vigil_core::queue_class;

/// stderr signature of a submission whose acknowledgment was lost in
/// transit. The controller usually accepted the job anyway, so the caller
/// must check accounting before resubmitting.
pub const LOST_ACK_SIGNATURE: &str =
    "Batch job submission failed: Socket timed out on send/recv operation";

/// Whether sbatch stderr carries the lost-acknowledgment signature.
pub fn is_lost_ack(stderr: &str) -> bool {
    stderr.contains(LOST_ACK_SIGNATURE)
}

/// Build the sbatch argument vector for a request.
///
/// Kept separate from process spawning so the exact invocation is
/// testable.
pub fn sbatch_args(req: &SbatchRequest) -> Vec<String> {
    let mut args = vec![
        "-J".to_string(),
        req.job_name.clone(),
        "-D".to_string(),
        req.working_directory.to_string(),
        "-o".to_string(),
        req.stdout_path.to_string(),
        "-e".to_string(),
        req.stderr_path.to_string(),
        "-t".to_string(),
        req.runtime_minutes.to_string(),
        "-p".to_string(),
        queue_class(req.runtime_minutes, req.queue_class.as_deref()),
        "-n".to_string(),
        req.cpus.to_string(),
    ];

    match req.memory {
        MemorySpec::PerCpu(mb) => {
            args.push("--mem-per-cpu".to_string());
            args.push(mb.to_string());
        }
        MemorySpec::Total(mb) => {
            args.push("--mem".to_string());
            args.push(mb.to_string());
        }
    }

    if let Some(constraint) = &req.constraint {
        args.push("--constraint".to_string());
        args.push(constraint.clone());
    }
    if let Some(qos) = &req.qos {
        args.push("--qos".to_string());
        args.push(qos.clone());
    }
    if let Some(account) = &req.account {
        args.push("--account".to_string());
        args.push(account.clone());
    }

    args.push("--wrap".to_string());
    args.push(format!("/usr/bin/env bash {}", req.script));
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SbatchRequest {
        SbatchRequest {
            job_name: "align_sample".to_string(),
            working_directory: "/data/jobs/align".into(),
            stdout_path: "/data/jobs/align/execution/stdout".into(),
            stderr_path: "/data/jobs/align/execution/stderr".into(),
            runtime_minutes: 1000,
            queue_class: None,
            cpus: 4,
            memory: MemorySpec::Total(8192),
            constraint: None,
            qos: None,
            account: None,
            script: "/data/jobs/align/execution/script".into(),
        }
    }

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .map(|i| args[i + 1].as_str())
    }

    #[test]
    fn test_args_derive_queue_class_from_runtime() {
        let args = sbatch_args(&request());
        assert_eq!(flag_value(&args, "-t"), Some("1000"));
        assert_eq!(flag_value(&args, "-p"), Some("medium"));
        assert_eq!(flag_value(&args, "-n"), Some("4"));
        assert_eq!(flag_value(&args, "--mem"), Some("8192"));
        assert!(!args.contains(&"--mem-per-cpu".to_string()));
    }

    #[test]
    fn test_explicit_queue_class_passes_through() {
        let mut req = request();
        req.queue_class = Some("priority".to_string());
        let args = sbatch_args(&req);
        assert_eq!(flag_value(&args, "-p"), Some("priority"));
    }

    #[test]
    fn test_per_cpu_memory_form() {
        let mut req = request();
        req.memory = MemorySpec::PerCpu(2048);
        let args = sbatch_args(&req);
        assert_eq!(flag_value(&args, "--mem-per-cpu"), Some("2048"));
        assert!(!args.contains(&"--mem".to_string()));
    }

    #[test]
    fn test_optional_passthroughs() {
        let mut req = request();
        req.constraint = Some("avx2".to_string());
        req.qos = Some("dedicated".to_string());
        req.account = Some("lab".to_string());
        let args = sbatch_args(&req);
        assert_eq!(flag_value(&args, "--constraint"), Some("avx2"));
        assert_eq!(flag_value(&args, "--qos"), Some("dedicated"));
        assert_eq!(flag_value(&args, "--account"), Some("lab"));
    }

    #[test]
    fn test_wrap_invokes_script_via_shell() {
        let args = sbatch_args(&request());
        assert_eq!(args.last().unwrap(), "/usr/bin/env bash /data/jobs/align/execution/script");
        assert_eq!(args[args.len() - 2], "--wrap");
    }

    #[test]
    fn test_lost_ack_signature() {
        let stderr = "sbatch: error: Batch job submission failed: \
            Socket timed out on send/recv operation\n";
        assert!(is_lost_ack(stderr));
        assert!(!is_lost_ack("sbatch: error: Invalid partition name"));
    }
}
