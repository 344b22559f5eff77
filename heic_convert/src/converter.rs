use crate::dispatcher::{ConvertResult, Converter};
use crate::error::ConversionError;
use crate::job::ConversionJob;
use crate::toolchain::Backend;
use shared_utils::{execute_external_command, safe_path_arg};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Converts one job per invocation of the detected external tool.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    backend: Backend,
}

impl ExternalConverter {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }
}

impl Converter for ExternalConverter {
    fn convert(&self, job: &ConversionJob) -> ConvertResult {
        // a leftover file would mask a tool that exits 0 without writing
        clear_destination(job.output())?;

        let input = safe_path_arg(job.input());
        let output = safe_path_arg(job.output());
        let args = self.backend.kind.conversion_args(&input, &output);

        let result = execute_external_command(self.backend.program.as_os_str(), &args).map_err(|e| {
            ConversionError::Spawn {
                input: job.input().to_path_buf(),
                tool: self.backend.tool_name(),
                reason: format!("{:#}", e),
            }
        })?;

        if !result.success() {
            return Err(ConversionError::ConversionFailed {
                input: job.input().to_path_buf(),
                tool: self.backend.tool_name(),
                status: result.exit_code,
                stderr: result.stderr,
            });
        }

        // some tools exit 0 after writing nothing for an unreadable input
        if !job.output().is_file() {
            return Err(ConversionError::ConversionFailed {
                input: job.input().to_path_buf(),
                tool: self.backend.tool_name(),
                status: result.exit_code,
                stderr: format!("no output written to {}", job.output().display()),
            });
        }

        Ok(())
    }
}

fn clear_destination(output: &Path) -> ConvertResult {
    match fs::remove_file(output) {
        Ok(()) => {
            debug!(output = %output.display(), "Removed existing destination");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConversionError::ClearDestination {
            destination: output.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
