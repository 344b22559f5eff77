//! External tool detection
//!
//! Finds the image-conversion program on PATH and checks it can read HEIC
//! before any job is dispatched. Runs once per invocation.

use crate::error::{Result, RunError};
use clap::ValueEnum;
use shared_utils::execute_external_command;
use std::ffi::OsStr;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Backend requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendChoice {
    /// ImageMagick if capable, otherwise ffmpeg
    #[default]
    Auto,
    Imagemagick,
    Ffmpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    ImageMagick,
    Ffmpeg,
}

impl BackendKind {
    /// Program names tried in order. IM7 ships `magick`, IM6 only `convert`.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            BackendKind::ImageMagick => &["magick", "convert"],
            BackendKind::Ffmpeg => &["ffmpeg"],
        }
    }

    fn capability_args(self) -> &'static [&'static str] {
        match self {
            BackendKind::ImageMagick => &["-version"],
            BackendKind::Ffmpeg => &["-hide_banner", "-decoders"],
        }
    }

    /// Lowercase token that must appear in the capability output.
    fn capability_token(self) -> &'static str {
        match self {
            BackendKind::ImageMagick => "heic",
            BackendKind::Ffmpeg => "hevc",
        }
    }

    fn missing_capability_hint(self) -> &'static str {
        match self {
            BackendKind::ImageMagick => {
                "no HEIC delegate listed; install libheif and rebuild/reinstall ImageMagick"
            }
            BackendKind::Ffmpeg => "no HEVC decoder listed; install an ffmpeg build with HEVC support",
        }
    }

    /// Known output-quality caveat of this backend, logged when it is selected.
    ///
    /// ffmpeg before 7.1 decodes only the first tile of a grid-tiled HEIC
    /// (the layout most phone cameras write), so `-frames:v 1` yields a crop
    /// of the photo. ImageMagick assembles the grid through libheif, which is
    /// why `auto` tries it first.
    pub fn limitation(self) -> Option<&'static str> {
        match self {
            BackendKind::ImageMagick => None,
            BackendKind::Ffmpeg => Some(
                "ffmpeg older than 7.1 converts only the first tile of grid-tiled HEIC images; prefer ImageMagick",
            ),
        }
    }

    /// Arguments converting `input` into `output`.
    pub fn conversion_args<'a>(self, input: &'a OsStr, output: &'a OsStr) -> Vec<&'a OsStr> {
        match self {
            BackendKind::ImageMagick => vec![input, output],
            BackendKind::Ffmpeg => vec![
                OsStr::new("-hide_banner"),
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                OsStr::new("-y"),
                OsStr::new("-i"),
                input,
                OsStr::new("-frames:v"),
                OsStr::new("1"),
                output,
            ],
        }
    }
}

/// A located, HEIC-capable conversion program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub kind: BackendKind,
    pub program: PathBuf,
}

impl Backend {
    /// Short program name for messages, e.g. `magick`.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Resolve `choice` into a usable backend, searching PATH.
///
/// In `auto` mode the first capable backend wins. When none is capable the
/// error is `ExternalToolIncapable` if some program was found, otherwise
/// `ExternalToolMissing`.
pub fn detect_backend(choice: BackendChoice) -> Result<Backend> {
    detect_backend_in(choice, None)
}

/// Like [`detect_backend`], but searches `search_path` (PATH syntax) instead of
/// the process PATH when given.
pub fn detect_backend_in(choice: BackendChoice, search_path: Option<&OsStr>) -> Result<Backend> {
    let backend = match choice {
        BackendChoice::Imagemagick => find_backend(BackendKind::ImageMagick, search_path),
        BackendChoice::Ffmpeg => find_backend(BackendKind::Ffmpeg, search_path),
        BackendChoice::Auto => detect_any(&[BackendKind::ImageMagick, BackendKind::Ffmpeg], search_path),
    }?;

    info!(
        tool = %backend.program.display(),
        kind = ?backend.kind,
        "External conversion tool ready"
    );
    if let Some(caveat) = backend.kind.limitation() {
        warn!("{}", caveat);
    }
    Ok(backend)
}

fn detect_any(kinds: &[BackendKind], search_path: Option<&OsStr>) -> Result<Backend> {
    let mut incapable = None;
    for &kind in kinds {
        match find_backend(kind, search_path) {
            Ok(backend) => return Ok(backend),
            Err(err @ RunError::ExternalToolIncapable { .. }) => {
                debug!(kind = ?kind, error = %err, "Backend found but not capable");
                incapable.get_or_insert(err);
            }
            Err(err) => debug!(kind = ?kind, error = %err, "Backend not found"),
        }
    }

    Err(incapable.unwrap_or_else(|| {
        let names: Vec<&str> = kinds.iter().flat_map(|k| k.candidates().iter().copied()).collect();
        RunError::ExternalToolMissing(names.join(", "))
    }))
}

fn find_backend(kind: BackendKind, search_path: Option<&OsStr>) -> Result<Backend> {
    locate(kind, kind.candidates(), search_path)
}

/// Locate the first of `candidates` on PATH (or `search_path`) and check it
/// for HEIC support.
fn locate(kind: BackendKind, candidates: &[&str], search_path: Option<&OsStr>) -> Result<Backend> {
    let program = candidates
        .iter()
        .find_map(|name| match search_path {
            Some(paths) => which::which_in(name, Some(paths), ".").ok(),
            None => which::which(name).ok(),
        })
        .ok_or_else(|| RunError::ExternalToolMissing(candidates.join(" or ")))?;

    check_capability(kind, program)
}

/// Run the capability query against `program` and look for the kind's token.
pub fn check_capability(kind: BackendKind, program: PathBuf) -> Result<Backend> {
    let backend = Backend { kind, program };
    let args: Vec<&OsStr> = kind.capability_args().iter().map(OsStr::new).collect();

    let result = execute_external_command(backend.program.as_os_str(), &args).map_err(|e| {
        RunError::ExternalToolIncapable {
            tool: backend.tool_name(),
            reason: format!("{:#}", e),
        }
    })?;

    if !result.success() {
        return Err(RunError::ExternalToolIncapable {
            tool: backend.tool_name(),
            reason: format!(
                "capability query {:?} exited with {:?}",
                kind.capability_args(),
                result.exit_code
            ),
        });
    }

    if !result
        .combined_output()
        .to_lowercase()
        .contains(kind.capability_token())
    {
        return Err(RunError::ExternalToolIncapable {
            tool: backend.tool_name(),
            reason: kind.missing_capability_hint().to_string(),
        });
    }

    Ok(backend)
}
