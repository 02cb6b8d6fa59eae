//! Report module - validation and PDF rendering of vehicle maintenance reports.
//!
//! - `model` - request payload types
//! - `validation` - declarative rule tables and their runner
//! - `layout` - the fixed document structure
//! - `engine` - pagination and PDF output
//! - `generator` - ties layout and engine together for one request

pub mod common;
pub mod engine;
pub mod font;
pub mod generator;
pub mod layout;
pub mod model;
pub mod traits;
pub mod validation;

pub use engine::{EngineSettings, PdfRenderEngine};
pub use generator::ReportGenerator;
pub use model::{MaintenanceEntry, OwnerRecord, ReportRequest, RequestParts, VehicleRecord};
pub use traits::{Generator, Validator};
pub use validation::{ValidationContext, ValidationError, ValidationErrors};

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur while rendering a report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The request reached the renderer without a required part.
    #[error("{0}")]
    Precondition(String),
    /// The content cannot be laid out on the page.
    #[error("document layout failed: {0}")]
    Layout(String),
    #[error("PDF generation produced an empty document")]
    EmptyOutput,
    #[error("failed to encode PDF content: {0}")]
    Encode(#[from] lopdf::Error),
    #[error("failed to write PDF document: {0}")]
    Write(#[from] std::io::Error),
}

/// Result of a successful report generation.
#[derive(Debug)]
pub struct GeneratedReport {
    pub filename: String,
    pub pdf: Vec<u8>,
    pub generated_at: NaiveDateTime,
}
