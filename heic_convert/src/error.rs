//! Error types
//!
//! Two layers: [`ConversionError`] belongs to a single job and is stored in
//! that job's outcome; [`RunError`] stops the whole run before any job is
//! dispatched.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one job. Never aborts sibling jobs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("destination {} is already claimed by {}", destination.display(), claimed_by.display())]
    DestinationCollision {
        destination: PathBuf,
        claimed_by: PathBuf,
    },

    #[error("{tool} failed on {} ({}){}", input.display(), exit_status(*status), stderr_suffix(stderr))]
    ConversionFailed {
        input: PathBuf,
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("could not remove existing {} before converting: {reason}", destination.display())]
    ClearDestination { destination: PathBuf, reason: String },

    #[error("could not start {tool} for {}: {reason}", input.display())]
    Spawn {
        input: PathBuf,
        tool: String,
        reason: String,
    },
}

fn exit_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.trim().lines().last() {
        Some(line) if !line.is_empty() => format!(": {}", line),
        _ => String::new(),
    }
}

/// Run-level failure, detected before the worker pool starts.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid output format '{0}', use 'png', 'jpg' or 'jpeg'")]
    InvalidOutputFormat(String),

    #[error("input path error for {}: {source}", path.display())]
    InputNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file {} does not have a .heic or .heif extension", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("no HEIC/HEIF files found in {}", .0.display())]
    NoConvertibleFiles(PathBuf),

    #[error("external tool not found on PATH: {0}")]
    ExternalToolMissing(String),

    #[error("external tool {tool} cannot convert HEIC: {reason}")]
    ExternalToolIncapable { tool: String, reason: String },

    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    WorkerPool(#[from] shared_utils::PoolError),
}

pub type Result<T> = std::result::Result<T, RunError>;
