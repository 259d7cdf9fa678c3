//! Error taxonomy shared by the tabular store and the SQL generator.
//!
//! Library operations return [`ExportError`]; the command layer wraps them in
//! `anyhow` context. Callers that want the plain (success flag, message) pair
//! convert a result with [`Outcome::from_result`].

use std::{fmt, io, path::PathBuf};

use serde::Serialize;
use thiserror::Error;

/// The file operation that was running when an export hit an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStep {
    CreateFile,
    WriteSchema,
    WriteInsertHeader,
    WriteRow(usize),
    Flush,
}

impl fmt::Display for IoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoStep::CreateFile => write!(f, "creating output file"),
            IoStep::WriteSchema => write!(f, "writing CREATE TABLE statement"),
            IoStep::WriteInsertHeader => write!(f, "writing INSERT INTO header"),
            IoStep::WriteRow(row) => write!(f, "writing row {row}"),
            IoStep::Flush => write!(f, "closing output file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unable to read input {path:?}: {reason}")]
    Ingest { path: PathBuf, reason: String },

    #[error(
        "Unable to export data: {} column(s) contain na/null values ({})",
        .columns.len(),
        .columns.join(", ")
    )]
    UncleanData { columns: Vec<String> },

    #[error(
        "Not all columns could be mapped to SQL types: processed {processed}, fetched {fetched} (unsupported: {})",
        .unmapped.join(", ")
    )]
    SchemaMismatch {
        processed: usize,
        fetched: usize,
        unmapped: Vec<String>,
    },

    #[error("Cannot generate a table without columns")]
    EmptySchema,

    #[error("Failed to convert column '{column}': {reason}")]
    Conversion { column: String, reason: String },

    #[error("I/O failure while {step} ({path:?}): {source}")]
    Io {
        step: IoStep,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub(crate) fn conversion(column: &str, reason: impl Into<String>) -> Self {
        ExportError::Conversion {
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn ingest(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ExportError::Ingest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Explicit ok/fail report for a finished operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub ok: bool,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }

    pub fn from_result<T, F>(result: Result<T, ExportError>, on_success: F) -> Self
    where
        F: FnOnce(T) -> String,
    {
        match result {
            Ok(value) => Outcome::success(on_success(value)),
            Err(err) => Outcome::failure(err.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.ok { "ok" } else { "failed" };
        write!(f, "[{status}] {}", self.message)
    }
}
