//! Report Module
//!
//! Renders a finished [`BatchResult`]: one line per job, then a summary.
//! `--json` swaps the text report for a serialized [`BatchSummary`], and
//! nothing else is written to the same stream.

use crate::dispatcher::BatchResult;
use crate::formats::OutputFormat;
use console::style;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct JobEntry<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub format: OutputFormat,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary<'a> {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub elapsed_secs: f64,
    pub jobs: Vec<JobEntry<'a>>,
}

impl<'a> From<&'a BatchResult> for BatchSummary<'a> {
    fn from(result: &'a BatchResult) -> Self {
        let ok = result.succeeded.iter().map(|job| JobEntry {
            input: job.input(),
            output: job.output(),
            format: job.format(),
            status: "ok",
            error: None,
        });
        let failed = result.failed.iter().map(|(job, err)| JobEntry {
            input: job.input(),
            output: job.output(),
            format: job.format(),
            status: "failed",
            error: Some(err.to_string()),
        });

        BatchSummary {
            total: result.total(),
            succeeded: result.succeeded.len(),
            failed: result.failed.len(),
            success_rate: result.success_rate(),
            elapsed_secs: result.elapsed.as_secs_f64(),
            jobs: ok.chain(failed).collect(),
        }
    }
}

pub fn write_report<W: Write>(result: &BatchResult, out: &mut W) -> io::Result<()> {
    for job in &result.succeeded {
        writeln!(
            out,
            "{} {} → {}",
            style("OK").green().bold(),
            job.input().display(),
            job.output().display()
        )?;
    }
    for (job, err) in &result.failed {
        writeln!(
            out,
            "{} {} → {}: {}",
            style("FAILED").red().bold(),
            job.input().display(),
            job.output().display(),
            err
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "📊 {} file(s): {} succeeded, {} failed ({:.1}% success) in {:.2}s",
        result.total(),
        result.succeeded.len(),
        result.failed.len(),
        result.success_rate(),
        result.elapsed.as_secs_f64()
    )?;

    if !result.failed.is_empty() {
        writeln!(out, "❌ Some files failed to convert:")?;
        for (job, err) in &result.failed {
            writeln!(out, "   {} → {}", job.input().display(), err)?;
        }
    }

    Ok(())
}

pub fn write_json_report<W: Write>(result: &BatchResult, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &BatchSummary::from(result))?;
    writeln!(out)
}

/// Write the report for `result` to `out`, as text or JSON.
pub fn emit_report<W: Write>(result: &BatchResult, json: bool, out: &mut W) -> io::Result<()> {
    if json {
        write_json_report(result, out)
    } else {
        write_report(result, out)
    }
}
