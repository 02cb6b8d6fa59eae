//! Traits for the report pipeline.

use chrono::NaiveDateTime;

use super::validation::{ValidationContext, ValidationErrors};
use super::{GeneratedReport, RenderError};

/// Field-level validation of a request whose nested objects are present.
pub trait Validator {
    /// Validate the state of the object, collecting every failure.
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationErrors>;
}

/// Document generators.
pub trait Generator<Req> {
    /// Generate a document from the request, stamped with `generated_at`.
    fn generate(&self, request: Req, generated_at: NaiveDateTime)
        -> Result<GeneratedReport, RenderError>;
}
