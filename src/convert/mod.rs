//! Output format conversion.
//!
//! A fill always produces a word-processing package first. When the caller
//! asks for another format the bytes are handed to a [`FormatConverter`].

pub mod soffice;

pub use soffice::SofficeConverter;

use crate::error::{FillerError, FillerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Formats a filled document can be delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Word-processing package, the format templates are authored in
    #[default]
    Docx,
    /// Portable document, produced by conversion
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }

    /// Appends this format's extension unless `name` already ends with it.
    pub fn file_name(self, name: &str) -> String {
        let name = name.trim();
        let suffix = format!(".{}", self.extension());
        if name.to_lowercase().ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = FillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(FillerError::invalid_input(
                "format",
                format!("unsupported output format '{}'", other),
            )),
        }
    }
}

/// Converts document bytes between formats.
///
/// Implementations own their own resource policy (timeouts, process
/// management); callers only see bytes or a `ConversionFailed` error.
pub trait FormatConverter: Send + Sync {
    fn convert(&self, bytes: &[u8], from: OutputFormat, to: OutputFormat) -> FillerResult<Vec<u8>>;

    /// Returns whether the converter can run in this environment.
    fn is_available(&self) -> bool;

    /// Human-readable converter name.
    fn name(&self) -> &str;
}
