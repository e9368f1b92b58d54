//! Placeholder scan-and-fill engine for word-processing templates.
//!
//! Templates are Office Open XML packages containing tokens such as `#name`
//! or `#sana`. Uploading a template records where every token occurs;
//! filling it substitutes caller-supplied values at those locations and
//! stores the result as a new document.
//!
//! # Features
//!
//! - **Run-independent matching**: tokens split across formatting runs are found
//! - **Tagged locations**: header, body paragraph, table cell and footer coordinates
//! - **Strict validation**: missing, unknown and blank values are rejected in that order
//! - **Date rendering**: values for date keys become long localized dates
//! - **Pluggable storage**: in-memory and filesystem stores behind traits
//!
//! # Architecture
//!
//! - [`domain`]: Location model, token rule, validation and value formatting
//! - [`document`]: Package container and paragraph-level document model
//! - [`store`]: Document and location storage collaborators
//! - [`convert`]: Output format conversion
//! - [`engine`]: Scanner, query surface and fill engine
//! - [`error`]: Error taxonomy with stable codes
//!
//! # Quick Start
//!
//! ```no_run
//! use docfill::{FillRequest, Principal, TemplateService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TemplateService::in_memory();
//! let principal = Principal::new("ali", "Acme");
//!
//! let bytes = std::fs::read("contract.docx")?;
//! let uploaded = service.upload(bytes, "contract.docx", "", &principal)?;
//!
//! let request = FillRequest::new(uploaded.id, "contract-filled")
//!     .value("#name", "Ali")
//!     .value("#sana", "01.02.2023");
//! let filled = service.fill(&request, &principal)?;
//! std::fs::write("contract-filled.docx", service.read(&filled.id)?.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Examples
//!
//! ## Finding Tokens
//!
//! ```
//! use docfill::PlaceholderMatcher;
//!
//! let matcher = PlaceholderMatcher::new();
//! assert_eq!(matcher.extract_all("Dear #name, see #ref_2."), vec!["#name", "#ref_2"]);
//! ```
//!
//! ## Formatting Dates
//!
//! ```
//! use docfill::ValueFormatter;
//!
//! let formatter = ValueFormatter::default();
//! assert_eq!(formatter.format("#sana", "01-02-2023"), "1 fevral 2023 yil");
//! assert_eq!(formatter.format("#sana", "not-a-date"), "not-a-date");
//! ```

pub mod config;
pub mod convert;
pub mod document;
pub mod domain;
pub mod engine;
pub mod error;
pub mod store;

pub use config::FillerConfig;
pub use convert::{FormatConverter, OutputFormat, SofficeConverter};
pub use document::Docx;
pub use domain::{
    Coordinates, DateLocale, DocumentId, LocationRecord, LocationType, PlaceholderLocation,
    PlaceholderMatcher, ScanStatistics, ValidationFailure, ValueFormatter,
};
pub use engine::{FillReport, FillRequest, FilledDocument, Scanner, TemplateService, UploadResult};
pub use error::{FillerError, FillerResult};
pub use store::{DocStatus, DocumentMetadata, DocumentStore, LocationStore, Principal};
