//! Relatório Module
//!
//! HTTP surface for generating vehicle maintenance reports.

pub mod error;
pub mod handlers;
pub mod service;

pub use error::ReportError;
pub use handlers::{config, configure_with_limit};
pub use service::{ReportService, ReportStage};
