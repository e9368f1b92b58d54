//! Configuration loaded from a TOML file.
//!
//! ```toml
//! [storage]
//! root = "./docfill-store"
//!
//! [converter]
//! enabled = true
//! program = "soffice"
//! timeout_secs = 60
//!
//! [formatter]
//! locale = "uz"
//! date_keywords = ["sana", "date", "дата"]
//! ```

use crate::convert::SofficeConverter;
use crate::domain::format::DEFAULT_DATE_KEYWORDS;
use crate::domain::{DateLocale, ValueFormatter};
use crate::error::{FillerError, FillerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    pub storage: StorageConfig,
    pub converter: ConverterConfig,
    pub formatter: FormatterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding documents, metadata and locations
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("docfill-store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub enabled: bool,
    pub program: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("soffice"),
            timeout_secs: 60,
        }
    }
}

impl ConverterConfig {
    /// The configured converter, or `None` when disabled.
    pub fn build(&self) -> Option<SofficeConverter> {
        self.enabled.then(|| {
            SofficeConverter::new(&self.program)
                .with_timeout(Duration::from_secs(self.timeout_secs.max(1)))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub locale: DateLocale,
    pub date_keywords: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            locale: DateLocale::default(),
            date_keywords: DEFAULT_DATE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FormatterConfig {
    pub fn build(&self) -> ValueFormatter {
        ValueFormatter::new(self.locale).with_date_keywords(self.date_keywords.iter().cloned())
    }
}

impl FillerConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> FillerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FillerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content).map_err(|reason| FillerError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}
