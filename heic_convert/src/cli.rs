use crate::dispatcher::{Concurrency, DEFAULT_CONCURRENCY};
use crate::error::{Result, RunError};
use crate::formats::OutputFormat;
use crate::toolchain::BackendChoice;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "heic-convert")]
#[command(version, about = "Batch-convert HEIC/HEIF images to PNG or JPEG with ImageMagick or ffmpeg", long_about = None)]
pub struct Cli {
    /// HEIC/HEIF file, or a directory whose HEIC/HEIF files are converted
    #[arg(short, long, value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
    pub input: PathBuf,

    /// Output image format: png, jpg or jpeg
    #[arg(short, long, value_name = "FORMAT")]
    pub format: String,

    /// Number of parallel conversions (values below 1 mean 1)
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY as i64, allow_negative_numbers = true)]
    pub workers: i64,

    /// External conversion tool
    #[arg(short, long, value_enum, default_value_t = BackendChoice::Auto)]
    pub backend: BackendChoice,

    /// Write converted files here instead of next to their sources
    #[arg(short, long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(short, long)]
    pub verbose: bool,

    /// Directory for log files (defaults to the system temp dir)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Validated settings for one run, built once from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Absolute, existing input path
    pub input: PathBuf,
    pub format: OutputFormat,
    pub concurrency: Concurrency,
    pub backend: BackendChoice,
    pub output_dir: Option<PathBuf>,
    pub json: bool,
}

impl RunConfig {
    pub fn new(input: PathBuf, format: OutputFormat) -> Self {
        Self {
            input,
            format,
            concurrency: Concurrency::default(),
            backend: BackendChoice::Auto,
            output_dir: None,
            json: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Validate flags: known format, existing input (made absolute), clamped
    /// worker count. Nothing here panics on bad input.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let format: OutputFormat = cli.format.parse()?;

        let input = cli
            .input
            .canonicalize()
            .map_err(|source| RunError::InputNotFound {
                path: cli.input.clone(),
                source,
            })?;

        let output_dir = match &cli.output_dir {
            Some(dir) => Some(std::path::absolute(dir).map_err(|source| RunError::OutputDir {
                path: dir.clone(),
                source,
            })?),
            None => None,
        };

        Ok(Self {
            input,
            format,
            concurrency: Concurrency::from_requested(cli.workers),
            backend: cli.backend,
            output_dir,
            json: cli.json,
        })
    }
}
