//! heic-convert: batch HEIC/HEIF → PNG/JPEG conversion through an external tool.
//!
//! The pipeline is enumerate → plan → dispatch → report. Image work is done by
//! ImageMagick or ffmpeg; this crate only decides what to convert, runs the
//! tool on a bounded worker pool, and accounts for every file.

pub mod cli;
pub mod converter;
pub mod dispatcher;
pub mod enumerate;
pub mod error;
pub mod formats;
pub mod job;
pub mod report;
pub mod runner;
pub mod toolchain;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use cli::{Cli, RunConfig};
pub use converter::ExternalConverter;
pub use dispatcher::{
    BatchResult, Concurrency, ConversionOutcome, ConvertResult, Converter, Dispatcher,
    DEFAULT_CONCURRENCY,
};
pub use enumerate::{enumerate_inputs, is_heic_file};
pub use error::{ConversionError, Result, RunError};
pub use formats::{OutputFormat, HEIC_EXTENSIONS};
pub use job::{build_jobs, destination_path, ConversionJob, ConversionRequest, PlannedJob};
pub use report::{emit_report, write_json_report, write_report, BatchSummary};
pub use runner::{execute, run, RunStatus, RUN_ERROR_EXIT_CODE};
pub use toolchain::{detect_backend, detect_backend_in, Backend, BackendChoice, BackendKind};
