//! Durable, append-only outcome log.
//!
//! One log file is shared by every driver and reconciler invocation; each
//! line is `timestamp<TAB>message`. Exit codes are the machine-readable
//! signal to the invoking engine; this log is for operators.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};

pub struct EventLog {
    path: Utf8PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Append one timestamped line.
    pub fn append(&self, message: &str) -> io::Result<()> {
        let line = format!(
            "{}\t{}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            message
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        tracing::info!("{message}");
        Ok(())
    }
}
