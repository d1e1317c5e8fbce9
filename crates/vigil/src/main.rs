//! vigil - submit SLURM jobs and reconcile their liveness for a workflow
//! engine.
//!
//! `vigil submit` places one task on the cluster and prints the
//! acknowledgment line the engine's capture expects. `vigil check` polls
//! accounting for a submitted job and keeps it present in the scheduler,
//! reporting through its exit code alone.

use camino::Utf8PathBuf;
use clap::Parser;
use miette::{miette, IntoDiagnostic, Result};
use std::process::ExitCode;
use vigil_check::{check, CheckConfig, CheckError};
use vigil_cli::{CheckArgs, Cli, Command, SubmitArgs};
use vigil_core::Backoff;
use vigil_slurm::{MemorySpec, SbatchRequest, SlurmCommands};
use vigil_submit::{submit_with_retry, SubmitConfig, SubmitError};

/// Exit code when the job's accounting trace is gone.
const EXIT_RECORD_VANISHED: u8 = 2;
/// Exit code when every accounting query failed.
const EXIT_QUERIES_EXHAUSTED: u8 = 3;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let user = cli
        .user
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| miette!("no requesting user; pass --user or set $USER"))?;

    match cli.command {
        Command::Submit(args) => run_submit(user, cli.log, args).await,
        Command::Check(args) => run_check(user, cli.log, args).await,
    }
}

async fn run_submit(user: String, log_path: Utf8PathBuf, args: SubmitArgs) -> Result<ExitCode> {
    let memory = match (args.mem_per_cpu, args.mem) {
        (Some(mb), None) => MemorySpec::PerCpu(mb),
        (None, Some(mb)) => MemorySpec::Total(mb),
        // clap's arg group enforces exactly one flag.
        _ => return Err(miette!("exactly one of --mem-per-cpu / --mem is required")),
    };

    let config = SubmitConfig {
        max_attempts: args.max_attempts,
        backoff: Backoff::new(args.min_delay, args.max_delay),
        user,
        commands: SlurmCommands::default(),
        log_path,
    };

    let request = SbatchRequest {
        job_name: args.job_name,
        working_directory: args.working_directory,
        stdout_path: args.stdout,
        stderr_path: args.stderr,
        runtime_minutes: args.runtime,
        queue_class: args.partition,
        cpus: args.cpus,
        memory,
        constraint: args.constraint,
        qos: args.qos,
        account: args.account,
        script: args.script,
    };

    match submit_with_retry(&config, &request).await {
        Ok(outcome) => {
            // The engine finds the job id in captured stdout.
            println!("{}", outcome.ack);
            Ok(ExitCode::SUCCESS)
        }
        Err(SubmitError::Exhausted { attempts, last_error }) => {
            eprintln!("{last_error}");
            eprintln!("vigil: submission failed after {attempts} attempts");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).into_diagnostic(),
    }
}

async fn run_check(user: String, log_path: Utf8PathBuf, args: CheckArgs) -> Result<ExitCode> {
    let config = CheckConfig {
        max_queries: args.max_queries,
        backoff: Backoff::new(args.min_delay, args.max_delay),
        time_factor: args.time_increment,
        user,
        commands: SlurmCommands::default(),
        log_path,
    };

    match check(&config, &args.job_id.to_string()).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err @ CheckError::RecordVanished { .. }) => {
            eprintln!("vigil: {err}");
            Ok(ExitCode::from(EXIT_RECORD_VANISHED))
        }
        Err(err @ CheckError::Exhausted { .. }) => {
            eprintln!("vigil: {err}");
            Ok(ExitCode::from(EXIT_QUERIES_EXHAUSTED))
        }
        Err(err) => Err(err).into_diagnostic(),
    }
}
