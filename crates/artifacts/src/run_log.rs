//! Append-only JSON Lines logs

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{ContractError, Role, RunFailure, RunRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ArtifactError, Result};
use crate::layout::ArtifactLayout;

/// Appends one JSON document per line, flushing after each.
///
/// The file is created on first append so a run that produces nothing
/// leaves nothing behind.
pub struct JsonlWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: usize,
}

impl JsonlWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            lines: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended through this writer
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn append<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let shown = self.path.display().to_string();
        let line = serde_json::to_string(value).map_err(|e| ArtifactError::Serialize {
            path: shown.clone(),
            message: e.to_string(),
        })?;

        let writer = match &mut self.writer {
            Some(writer) => writer,
            slot => slot.insert(open_append(&self.path)?),
        };

        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| ArtifactError::write(&shown, e))?;
        self.lines += 1;
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    let shown = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ArtifactError::write(&shown, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ArtifactError::write(&shown, e))?;
    debug!(path = %shown, "jsonl log opened");
    Ok(BufWriter::new(file))
}

/// Read every non-blank line of a JSONL file
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let shown = path.display().to_string();
    let file = File::open(path).map_err(ContractError::from)?;
    let mut values = Vec::new();

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(ContractError::from)?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|e| {
            ContractError::artifact_format(&shown, format!("line {}: {e}", i + 1))
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Run log and failure log of one model run
pub struct RunLog {
    records: JsonlWriter,
    failures: JsonlWriter,
}

impl RunLog {
    pub fn new(layout: &ArtifactLayout, role: Role, started: DateTime<Utc>) -> Self {
        Self {
            records: JsonlWriter::new(layout.run_log(role, started)),
            failures: JsonlWriter::new(layout.failures(role)),
        }
    }

    pub fn append_record(&mut self, record: &RunRecord) -> Result<()> {
        self.records.append(record)
    }

    pub fn append_failure(&mut self, failure: &RunFailure) -> Result<()> {
        self.failures.append(failure)
    }

    pub fn record_path(&self) -> &Path {
        self.records.path()
    }

    pub fn failure_path(&self) -> &Path {
        self.failures.path()
    }

    pub fn records_written(&self) -> usize {
        self.records.lines()
    }

    pub fn failures_written(&self) -> usize {
        self.failures.lines()
    }
}
