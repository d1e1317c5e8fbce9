//! SLURM request and record types.

use camino::Utf8PathBuf;

/// Program names for the scheduler surfaces.
///
/// Defaults to the real binaries; tests point these at fixture scripts
/// instead of mutating the process environment.
#[derive(Debug, Clone)]
pub struct SlurmCommands {
    pub sbatch: Utf8PathBuf,
    pub sacct: Utf8PathBuf,
    /// Shell used to re-execute submission scripts.
    pub shell: Utf8PathBuf,
}

impl Default for SlurmCommands {
    fn default() -> Self {
        Self {
            sbatch: "sbatch".into(),
            sacct: "sacct".into(),
            shell: "bash".into(),
        }
    }
}

/// One parsable accounting record: `JobID|WorkDir|State`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SacctRecord {
    pub job_id: String,
    pub work_dir: Utf8PathBuf,
    /// Raw state string; sacct may suffix it (`CANCELLED by 12345`).
    pub state: String,
}

/// Memory request, exactly one form.
///
/// sbatch takes either `--mem-per-cpu` or `--mem`; supplying both or
/// neither is a configuration error, so the type admits exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySpec {
    /// `--mem-per-cpu`, in MB.
    PerCpu(u64),
    /// `--mem`, in MB.
    Total(u64),
}

/// A fully specified sbatch resource request.
#[derive(Debug, Clone)]
pub struct SbatchRequest {
    pub job_name: String,
    pub working_directory: Utf8PathBuf,
    pub stdout_path: Utf8PathBuf,
    pub stderr_path: Utf8PathBuf,
    pub runtime_minutes: u64,
    /// Explicit queue class; `None` derives the class from the runtime.
    pub queue_class: Option<String>,
    pub cpus: u32,
    pub memory: MemorySpec,
    pub constraint: Option<String>,
    pub qos: Option<String>,
    pub account: Option<String>,
    /// Script handed to `--wrap` via the shell.
    pub script: Utf8PathBuf,
}
