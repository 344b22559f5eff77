use crate::error::RunError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Extensions (lowercase, without dot) accepted as conversion input.
pub const HEIC_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Output image format requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpg,
    Jpeg,
}

impl OutputFormat {
    /// Extension written on the destination file. `jpeg` and `jpg` are kept
    /// as requested.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Jpeg => "jpeg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" => Ok(OutputFormat::Jpg),
            "jpeg" => Ok(OutputFormat::Jpeg),
            _ => Err(RunError::InvalidOutputFormat(s.to_string())),
        }
    }
}
