//! Conversion jobs and destination planning.

use crate::error::ConversionError;
use crate::formats::OutputFormat;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One input file and the format it should become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_format: OutputFormat,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_format: OutputFormat) -> Self {
        Self {
            input_path: input_path.into(),
            output_format,
        }
    }
}

/// A request plus its computed destination. Consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub request: ConversionRequest,
    pub output_path: PathBuf,
}

impl ConversionJob {
    pub fn input(&self) -> &Path {
        &self.request.input_path
    }

    pub fn output(&self) -> &Path {
        &self.output_path
    }

    pub fn format(&self) -> OutputFormat {
        self.request.output_format
    }
}

/// A job as planned, before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedJob {
    Ready(ConversionJob),
    /// Known to fail without running the converter.
    Rejected(ConversionJob, ConversionError),
}

impl PlannedJob {
    pub fn job(&self) -> &ConversionJob {
        match self {
            PlannedJob::Ready(job) | PlannedJob::Rejected(job, _) => job,
        }
    }
}

/// Destination for `input`: same base name, extension replaced by the format's
/// lowercase extension, placed in `output_dir` or next to the input.
///
/// ```
/// use heic_convert::{destination_path, OutputFormat};
/// use std::path::Path;
///
/// let out = destination_path(Path::new("/pics/photo.HEIC"), OutputFormat::Png, None);
/// assert_eq!(out, Path::new("/pics/photo.png"));
/// ```
pub fn destination_path(input: &Path, format: OutputFormat, output_dir: Option<&Path>) -> PathBuf {
    let mut file_name: OsString = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    file_name.push(".");
    file_name.push(format.extension());

    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new(""));
    dir.join(file_name)
}

/// Plan one job per file, in input order.
///
/// A destination already claimed by an earlier file rejects the later one
/// with `DestinationCollision`.
pub fn build_jobs(files: &[PathBuf], format: OutputFormat, output_dir: Option<&Path>) -> Vec<PlannedJob> {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(files.len());

    files
        .iter()
        .map(|input| {
            let job = ConversionJob {
                request: ConversionRequest::new(input.clone(), format),
                output_path: destination_path(input, format, output_dir),
            };

            match claimed.get(&job.output_path) {
                Some(first) => {
                    warn!(
                        input = %input.display(),
                        destination = %job.output_path.display(),
                        claimed_by = %first.display(),
                        "Destination collision"
                    );
                    let err = ConversionError::DestinationCollision {
                        destination: job.output_path.clone(),
                        claimed_by: first.clone(),
                    };
                    PlannedJob::Rejected(job, err)
                }
                None => {
                    claimed.insert(job.output_path.clone(), input.clone());
                    PlannedJob::Ready(job)
                }
            }
        })
        .collect()
}
