//! Run orchestration: enumerate, plan, dispatch, report.

use crate::cli::{Cli, RunConfig};
use crate::converter::ExternalConverter;
use crate::dispatcher::{BatchResult, Converter, Dispatcher};
use crate::enumerate::enumerate_inputs;
use crate::error::{Result, RunError};
use crate::job::build_jobs;
use crate::report::emit_report;
use crate::toolchain::detect_backend_in;
use std::ffi::OsStr;
use std::io::Write;
use tracing::{error, info, warn};

/// How a run ended, when it got as far as looking for files.
#[derive(Debug)]
pub enum RunStatus {
    /// Every discovered file converted.
    Completed(BatchResult),
    /// All files were attempted and at least one failed.
    CompletedWithFailures(BatchResult),
    /// The input directory held no HEIC/HEIF files.
    NothingToConvert,
}

impl RunStatus {
    pub fn from_batch(result: BatchResult) -> Self {
        if result.is_success() {
            RunStatus::Completed(result)
        } else {
            RunStatus::CompletedWithFailures(result)
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RunStatus::Completed(_) | RunStatus::NothingToConvert => 0,
            RunStatus::CompletedWithFailures(_) => 1,
        }
    }

    pub fn batch(&self) -> Option<&BatchResult> {
        match self {
            RunStatus::Completed(result) | RunStatus::CompletedWithFailures(result) => Some(result),
            RunStatus::NothingToConvert => None,
        }
    }
}

/// Exit code for a run-level error: flags, tool or input problems.
pub const RUN_ERROR_EXIT_CODE: u8 = 2;

/// Convert everything `config` points at with `converter`, writing the
/// report to `out`.
///
/// The converter is assumed ready; tool detection happens before this. With
/// `config.json` set, `out` receives exactly one JSON document, an empty
/// summary when there was nothing to convert.
pub fn run<C: Converter, W: Write>(config: &RunConfig, converter: &C, out: &mut W) -> Result<RunStatus> {
    info!(input = %config.input.display(), format = %config.format, "Input path");

    let files = match enumerate_inputs(&config.input) {
        Ok(files) => files,
        Err(RunError::NoConvertibleFiles(dir)) => {
            warn!(dir = %dir.display(), "No HEIC/HEIF files found, nothing to do");
            if config.json {
                write_report(&BatchResult::new(), true, out);
            }
            return Ok(RunStatus::NothingToConvert);
        }
        Err(err) => return Err(err),
    };

    if let Some(dir) = &config.output_dir {
        std::fs::create_dir_all(dir).map_err(|source| RunError::OutputDir {
            path: dir.clone(),
            source,
        })?;
    }

    let plan = build_jobs(&files, config.format, config.output_dir.as_deref());
    let result = Dispatcher::new(config.concurrency).dispatch(plan, converter)?;
    write_report(&result, config.json, out);

    Ok(RunStatus::from_batch(result))
}

fn write_report<W: Write>(result: &BatchResult, json: bool, out: &mut W) {
    if let Err(e) = emit_report(result, json, out) {
        warn!(error = %e, "Failed to write report");
    }
}

/// Validate `cli`, detect the tool, convert, and return the process exit code.
///
/// The report goes to `out`; human status lines and run-level errors go to
/// `status`, so `out` stays machine-readable under `--json`. `search_path`
/// overrides PATH for tool lookup.
pub fn execute<O: Write, E: Write>(
    cli: &Cli,
    search_path: Option<&OsStr>,
    out: &mut O,
    status: &mut E,
) -> u8 {
    let outcome = RunConfig::from_cli(cli).and_then(|config| {
        let backend = detect_backend_in(config.backend, search_path)?;
        run(&config, &ExternalConverter::new(backend), out)
    });

    let line = match &outcome {
        Ok(RunStatus::NothingToConvert) => {
            format!("📂 No HEIC/HEIF files found in {}", cli.input.display())
        }
        Ok(RunStatus::Completed(_)) => "✅ Processing completed successfully.".to_string(),
        Ok(RunStatus::CompletedWithFailures(result)) => format!(
            "❌ {} of {} file(s) failed to convert",
            result.failed.len(),
            result.total()
        ),
        Err(e) => {
            error!(error = %e, "Run aborted before conversion");
            format!("❌ Error: {}", e)
        }
    };
    if let Err(e) = writeln!(status, "{}", line) {
        warn!(error = %e, "Failed to write status line");
    }

    match outcome {
        Ok(run_status) => run_status.exit_code(),
        Err(_) => RUN_ERROR_EXIT_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{Concurrency, ConvertResult};
    use crate::error::ConversionError;
    use crate::formats::OutputFormat;
    use crate::job::ConversionJob;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"heic bytes").unwrap();
        path
    }

    fn copy_converter(job: &ConversionJob) -> ConvertResult {
        fs::copy(job.input(), job.output())
            .map(|_| ())
            .map_err(|e| ConversionError::Spawn {
                input: job.input().to_path_buf(),
                tool: "copy".into(),
                reason: e.to_string(),
            })
    }

    fn config(input: &Path, format: OutputFormat, workers: i64) -> RunConfig {
        RunConfig::new(input.to_path_buf(), format).with_concurrency(Concurrency::from_requested(workers))
    }

    #[test]
    fn test_end_to_end_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "img1.heic");
        touch(dir.path(), "img2.heic");

        let status = run(&config(dir.path(), OutputFormat::Jpg, 2), &copy_converter, &mut io::sink()).unwrap();
        assert_eq!(status.exit_code(), 0);

        let batch = status.batch().unwrap();
        assert!(batch.failed.is_empty());
        let mut outputs: Vec<_> = batch
            .succeeded
            .iter()
            .map(|j| j.output().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        outputs.sort();
        assert_eq!(outputs, vec!["img1.jpg", "img2.jpg"]);
        assert!(dir.path().join("img1.jpg").is_file());
        assert!(dir.path().join("img2.jpg").is_file());
    }

    #[test]
    fn test_single_file() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "photo.HEIC");

        let status = run(&config(&file, OutputFormat::Png, 4), &copy_converter, &mut io::sink()).unwrap();
        assert!(matches!(status, RunStatus::Completed(_)));
        assert!(dir.path().join("photo.png").is_file());
    }

    #[test]
    fn test_single_file_with_wrong_extension_is_run_error() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "photo.png");
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let converter = |_: &ConversionJob| -> ConvertResult {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        };

        assert!(matches!(
            run(&config(&file, OutputFormat::Jpg, 1), &converter, &mut io::sink()),
            Err(RunError::UnsupportedExtension(_))
        ));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_directory_exits_zero() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "notes.txt");

        let status = run(&config(dir.path(), OutputFormat::Png, 4), &copy_converter, &mut io::sink()).unwrap();
        assert!(matches!(status, RunStatus::NothingToConvert));
        assert_eq!(status.exit_code(), 0);
        assert!(status.batch().is_none());
    }

    #[test]
    fn test_partial_failure_exits_nonzero() {
        let dir = TempDir::new().unwrap();
        for i in 1..=5 {
            touch(dir.path(), &format!("img{}.heic", i));
        }
        let converter = |job: &ConversionJob| -> ConvertResult {
            if job.input().ends_with("img3.heic") {
                Err(ConversionError::ConversionFailed {
                    input: job.input().to_path_buf(),
                    tool: "mock".into(),
                    status: Some(1),
                    stderr: String::new(),
                })
            } else {
                copy_converter(job)
            }
        };

        let status = run(&config(dir.path(), OutputFormat::Png, 3), &converter, &mut io::sink()).unwrap();
        assert_eq!(status.exit_code(), 1);
        let batch = status.batch().unwrap();
        assert_eq!(batch.succeeded.len(), 4);
        assert_eq!(batch.failed.len(), 1);
        assert!(batch.failed[0].0.input().ends_with("img3.heic"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_case_collision_reported_not_overwritten() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.heic");
        touch(dir.path(), "a.HEIC");

        let status = run(&config(dir.path(), OutputFormat::Png, 2), &copy_converter, &mut io::sink()).unwrap();
        assert_eq!(status.exit_code(), 1);

        let batch = status.batch().unwrap();
        assert_eq!(batch.succeeded.len(), 1);
        assert_eq!(batch.succeeded[0].input().file_name().unwrap(), "a.HEIC");
        assert_eq!(batch.failed.len(), 1);
        assert_eq!(batch.failed[0].0.input().file_name().unwrap(), "a.heic");
        assert!(matches!(
            batch.failed[0].1,
            ConversionError::DestinationCollision { .. }
        ));
    }

    #[test]
    fn test_output_dir_is_created() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "img.heic");
        let out = dir.path().join("converted");

        let cfg = config(dir.path(), OutputFormat::Jpeg, 1).with_output_dir(&out);
        let status = run(&cfg, &copy_converter, &mut io::sink()).unwrap();

        assert_eq!(status.exit_code(), 0);
        assert!(out.join("img.jpeg").is_file());
        assert!(!dir.path().join("img.jpeg").exists());
    }

    #[test]
    fn test_empty_directory_json_is_empty_summary() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(dir.path(), OutputFormat::Png, 1);
        cfg.json = true;

        let mut out = Vec::new();
        let status = run(&cfg, &copy_converter, &mut out).unwrap();
        assert!(matches!(status, RunStatus::NothingToConvert));

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["total"], 0);
        assert!(value["jobs"].as_array().unwrap().is_empty());
    }

    #[cfg(unix)]
    mod end_to_end {
        use super::*;
        use crate::runner::execute;
        use crate::test_support::write_script;
        use clap::Parser;

        const FAKE_MAGICK: &str = "if [ \"$1\" = \"-version\" ]; then echo 'Delegates (built-in): heic jpeg png'; exit 0; fi\ncp \"$1\" \"$2\"";

        fn cli(args: &[&str]) -> Cli {
            Cli::try_parse_from(std::iter::once("heic-convert").chain(args.iter().copied())).unwrap()
        }

        fn exec(cli: &Cli, tools: &Path) -> (u8, String, String) {
            let mut out = Vec::new();
            let mut status = Vec::new();
            let code = execute(cli, Some(tools.as_os_str()), &mut out, &mut status);
            (
                code,
                String::from_utf8(out).unwrap(),
                String::from_utf8(status).unwrap(),
            )
        }

        #[test]
        fn test_missing_tool_stops_before_any_job() {
            let tools = TempDir::new().unwrap();
            let photos = TempDir::new().unwrap();
            touch(photos.path(), "img1.heic");
            let input = photos.path().to_string_lossy().into_owned();

            let (code, out, status) = exec(&cli(&["-i", &input, "-f", "png", "-b", "imagemagick"]), tools.path());

            assert_eq!(code, RUN_ERROR_EXIT_CODE);
            assert!(out.is_empty());
            assert!(status.contains("not found"));
            assert!(!photos.path().join("img1.png").exists());
        }

        #[test]
        fn test_invalid_format_is_run_error() {
            let tools = TempDir::new().unwrap();
            write_script(tools.path(), "magick", FAKE_MAGICK);
            let photos = TempDir::new().unwrap();
            let input = photos.path().to_string_lossy().into_owned();

            let (code, out, status) = exec(&cli(&["-i", &input, "-f", "webp"]), tools.path());
            assert_eq!(code, RUN_ERROR_EXIT_CODE);
            assert!(out.is_empty());
            assert!(status.contains("invalid output format"));
        }

        #[test]
        fn test_json_output_is_a_single_document() {
            let tools = TempDir::new().unwrap();
            write_script(tools.path(), "magick", FAKE_MAGICK);
            let photos = TempDir::new().unwrap();
            touch(photos.path(), "img1.heic");
            touch(photos.path(), "img2.heic");
            let input = photos.path().to_string_lossy().into_owned();

            let (code, out, status) = exec(&cli(&["-i", &input, "-f", "jpg", "--json"]), tools.path());

            assert_eq!(code, 0);
            let value: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value["total"], 2);
            assert_eq!(value["succeeded"], 2);
            assert!(status.contains("completed successfully"));
            assert!(photos.path().join("img1.jpg").is_file());
        }

        #[test]
        fn test_json_with_nothing_to_convert() {
            let tools = TempDir::new().unwrap();
            write_script(tools.path(), "magick", FAKE_MAGICK);
            let photos = TempDir::new().unwrap();
            let input = photos.path().to_string_lossy().into_owned();

            let (code, out, status) = exec(&cli(&["-i", &input, "-f", "png", "--json"]), tools.path());

            assert_eq!(code, 0);
            let value: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value["total"], 0);
            assert!(status.contains("No HEIC/HEIF files found"));
        }

        #[test]
        fn test_text_report_on_out_and_status_separate() {
            let tools = TempDir::new().unwrap();
            write_script(tools.path(), "magick", FAKE_MAGICK);
            let photos = TempDir::new().unwrap();
            touch(photos.path(), "img1.heic");
            let input = photos.path().to_string_lossy().into_owned();

            let (code, out, status) = exec(&cli(&["-i", &input, "-f", "png"]), tools.path());

            assert_eq!(code, 0);
            assert!(out.contains("1 file(s): 1 succeeded, 0 failed"));
            assert!(!out.contains("completed successfully"));
            assert!(status.contains("completed successfully"));
        }
    }
}
