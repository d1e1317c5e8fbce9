//! CLI argument parsing for vigil.

use camino::Utf8PathBuf;
use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Submit cluster jobs and keep them alive until a final state")]
pub struct Cli {
    /// Requesting user for scheduler queries (defaults to $USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Append-only outcome log shared across invocations
    #[arg(long, global = true, default_value = "vigil.log")]
    pub log: Utf8PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a script to SLURM, retrying transient submission failures
    Submit(SubmitArgs),
    /// Check whether a submitted job is alive, resubmitting it if needed
    Check(CheckArgs),
}

#[derive(Args, Debug)]
#[command(group = ArgGroup::new("memory").required(true))]
pub struct SubmitArgs {
    /// Maximum number of submission attempts
    #[arg(short = 's', long, default_value = "3")]
    pub max_attempts: usize,

    /// Minimum base delay between attempts in seconds
    #[arg(short = 'l', long, default_value = "60")]
    pub min_delay: f64,

    /// Maximum base delay between attempts in seconds
    #[arg(short = 'm', long, default_value = "120")]
    pub max_delay: f64,

    /// Job name
    #[arg(short = 'J', long)]
    pub job_name: String,

    /// Working directory of the task
    #[arg(short = 'D', long, default_value = "./")]
    pub working_directory: Utf8PathBuf,

    /// Stdout capture path
    #[arg(short = 'o', long)]
    pub stdout: Utf8PathBuf,

    /// Stderr capture path
    #[arg(short = 'e', long)]
    pub stderr: Utf8PathBuf,

    /// Requested runtime in minutes
    #[arg(short = 't', long)]
    pub runtime: u64,

    /// Explicit queue class (otherwise derived from the runtime)
    #[arg(short = 'p', long)]
    pub partition: Option<String>,

    /// CPU count
    #[arg(short = 'n', long, default_value = "1")]
    pub cpus: u32,

    /// Memory per cpu, in MB
    #[arg(long, group = "memory")]
    pub mem_per_cpu: Option<u64>,

    /// Total memory, in MB
    #[arg(long, group = "memory")]
    pub mem: Option<u64>,

    /// Node constraint passed through to sbatch
    #[arg(long)]
    pub constraint: Option<String>,

    /// Quality-of-service passed through to sbatch
    #[arg(long)]
    pub qos: Option<String>,

    /// Account passed through to sbatch
    #[arg(long)]
    pub account: Option<String>,

    /// Script for SLURM to run
    pub script: Utf8PathBuf,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Maximum number of accounting queries before reporting failure
    #[arg(short = 'n', long, default_value = "4")]
    pub max_queries: usize,

    /// Minimum base delay between queries in seconds
    #[arg(short = 'l', long, default_value = "150")]
    pub min_delay: f64,

    /// Maximum base delay between queries in seconds
    #[arg(short = 'm', long, default_value = "300")]
    pub max_delay: f64,

    /// Multiplication factor for the runtime request after a timeout
    #[arg(short = 't', long, default_value = "1.5")]
    pub time_increment: f64,

    /// Job number to check
    pub job_id: u64,
}
