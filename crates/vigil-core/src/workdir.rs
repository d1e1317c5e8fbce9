//! The working-directory artifact layout.
//!
//! One working directory is exclusively owned by one logical task for its
//! whole lifetime, across any number of resubmissions. Its `execution/`
//! subdirectory holds the durable handoff artifacts: the submission script
//! ("what was last requested"), the acknowledgment capture ("which job id
//! the task answers to"), and the return-code file ("what happened").

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use thiserror::Error;
use vigil_parsers::parse_trailing_job_id;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("acknowledgment capture {path} is empty")]
    EmptyAck { path: Utf8PathBuf },
    #[error("acknowledgment capture {path} has no trailing job id")]
    MalformedAck { path: Utf8PathBuf },
}

#[derive(Debug, Clone)]
pub struct WorkDir {
    root: Utf8PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn execution(&self) -> Utf8PathBuf {
        self.root.join("execution")
    }

    /// Submission script; carries the `-t <minutes> -p <class>` request.
    pub fn submit_script(&self) -> Utf8PathBuf {
        self.execution().join("script.submit")
    }

    /// Captured stdout of the submission call; first line ends in the
    /// assigned job id.
    pub fn ack_capture(&self) -> Utf8PathBuf {
        self.execution().join("stdout.submit")
    }

    /// Return-code artifact of the last attempt, if one finished.
    pub fn return_code(&self) -> Utf8PathBuf {
        self.execution().join("rc")
    }

    /// Note left behind when a lost acknowledgment was recovered through
    /// the accounting scan.
    pub fn recovery_note(&self) -> Utf8PathBuf {
        self.execution().join("sacct.submit")
    }

    /// The job id this task believes it has, from the first line of the
    /// acknowledgment capture.
    pub fn read_acked_job_id(&self) -> Result<String, ArtifactError> {
        let path = self.ack_capture();
        let content = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        let first = content
            .lines()
            .next()
            .ok_or_else(|| ArtifactError::EmptyAck { path: path.clone() })?;
        parse_trailing_job_id(first).ok_or(ArtifactError::MalformedAck { path })
    }

    pub fn read_submit_script(&self) -> Result<String, ArtifactError> {
        let path = self.submit_script();
        fs::read_to_string(&path).map_err(|source| ArtifactError::Io { path, source })
    }

    pub fn write_submit_script(&self, content: &str) -> Result<(), ArtifactError> {
        let path = self.submit_script();
        fs::write(&path, content).map_err(|source| ArtifactError::Io { path, source })
    }

    /// Overwrite the acknowledgment capture, creating `execution/` first
    /// if the directory does not exist yet.
    pub fn write_ack(&self, content: &str) -> Result<(), ArtifactError> {
        self.ensure_execution()?;
        let path = self.ack_capture();
        fs::write(&path, format!("{content}\n")).map_err(|source| ArtifactError::Io {
            path, source,
        })
    }

    pub fn write_recovery_note(&self, note: &str) -> Result<(), ArtifactError> {
        self.ensure_execution()?;
        let path = self.recovery_note();
        fs::write(&path, format!("{note}\n")).map_err(|source| ArtifactError::Io {
            path, source,
        })
    }

    /// Remove a stale return-code artifact. Absence is not an error.
    pub fn clear_return_code(&self) -> Result<(), ArtifactError> {
        match fs::remove_file(self.return_code()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArtifactError::Io {
                path: self.return_code(),
                source,
            }),
        }
    }

    fn ensure_execution(&self) -> Result<(), ArtifactError> {
        let path = self.execution();
        fs::create_dir_all(&path).map_err(|source| ArtifactError::Io { path, source })
    }
}
